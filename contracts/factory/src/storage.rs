use soroban_sdk::{contracttype, Address, BytesN, Env};

/// Storage keys for the factory contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Account allowed to rewire the protocol fee switch
    FeeToSetter,
    /// Protocol fee recipient, absent while the fee is off
    FeeTo,
    /// Pair WASM hash for deployment
    PairWasmHash,
    /// (token0, token1) -> pair address
    Pair(Address, Address),
    /// Total number of pairs created (counter for indexed storage)
    PairCount,
    /// Pair address at index (indexed storage to avoid unbounded Vec)
    PairAt(u32),
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280;
const INSTANCE_TTL_EXTEND: u32 = 518400;
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Fee switch ===

pub fn has_fee_to_setter(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::FeeToSetter)
}

pub fn get_fee_to_setter(env: &Env) -> Address {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::FeeToSetter)
        .expect("Not initialized")
}

pub fn set_fee_to_setter(env: &Env, setter: &Address) {
    env.storage().instance().set(&DataKey::FeeToSetter, setter);
    extend_instance_ttl(env);
}

pub fn get_fee_to(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::FeeTo)
}

pub fn set_fee_to(env: &Env, fee_to: &Option<Address>) {
    match fee_to {
        Some(fee_to) => env.storage().instance().set(&DataKey::FeeTo, fee_to),
        None => env.storage().instance().remove(&DataKey::FeeTo),
    }
    extend_instance_ttl(env);
}

// === Pair WASM ===

pub fn get_pair_wasm_hash(env: &Env) -> BytesN<32> {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::PairWasmHash)
        .expect("Not initialized")
}

pub fn set_pair_wasm_hash(env: &Env, hash: &BytesN<32>) {
    env.storage().instance().set(&DataKey::PairWasmHash, hash);
    extend_instance_ttl(env);
}

// === Pair registry ===

/// Register a pair under its canonical token ordering
pub fn add_pair(env: &Env, token_a: &Address, token_b: &Address, pair: &Address) {
    let (token0, token1) = if token_a < token_b {
        (token_a.clone(), token_b.clone())
    } else {
        (token_b.clone(), token_a.clone())
    };

    let pair_key = DataKey::Pair(token0, token1);
    env.storage().persistent().set(&pair_key, pair);
    extend_persistent_ttl(env, &pair_key);

    let count = get_pair_count(env);
    let at_key = DataKey::PairAt(count);
    env.storage().persistent().set(&at_key, pair);
    extend_persistent_ttl(env, &at_key);

    env.storage().instance().set(&DataKey::PairCount, &(count + 1));
}

pub fn get_pair(env: &Env, token_a: &Address, token_b: &Address) -> Option<Address> {
    let (token0, token1) = if token_a < token_b {
        (token_a.clone(), token_b.clone())
    } else {
        (token_b.clone(), token_a.clone())
    };
    env.storage()
        .persistent()
        .get(&DataKey::Pair(token0, token1))
}

pub fn get_pair_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::PairCount)
        .unwrap_or(0)
}

pub fn get_pair_at(env: &Env, index: u32) -> Option<Address> {
    env.storage().persistent().get(&DataKey::PairAt(index))
}
