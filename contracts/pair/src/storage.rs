use amm_types::{PairConfig, Reserves};
use soroban_sdk::{contracttype, Address, Env, U256};

/// Storage keys for the pair contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Immutable pair configuration (Instance storage)
    Config,
    /// Cached reserves and last update timestamp (Instance storage)
    Reserves,
    /// Shares locked forever by the first mint (Instance storage)
    MinimumLiquidity,
    /// Liquidity share supply (Instance storage)
    TotalSupply,
    /// account -> share balance (Persistent storage)
    Balance(Address),
    /// (from, spender) -> share allowance (Persistent storage)
    Allowance(Address, Address),
    /// reserve0 * reserve1 as of the latest liquidity event, tracked
    /// while protocol fees are switched on (Instance storage)
    KLast,
    /// Q64.64 price accumulators (Instance storage)
    Price0CumulativeLast,
    Price1CumulativeLast,
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

/// Extend instance storage TTL
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

/// Extend persistent storage TTL for a key
pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Config ===

pub fn get_config(env: &Env) -> PairConfig {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("Not initialized")
}

pub fn set_config(env: &Env, config: &PairConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

// === Reserves ===

pub fn get_reserves(env: &Env) -> Reserves {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Reserves)
        .expect("Not initialized")
}

pub fn set_reserves(env: &Env, reserves: &Reserves) {
    env.storage().instance().set(&DataKey::Reserves, reserves);
    extend_instance_ttl(env);
}

// === Minimum liquidity ===

pub fn get_minimum_liquidity(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::MinimumLiquidity)
        .expect("Not initialized")
}

pub fn set_minimum_liquidity(env: &Env, amount: i128) {
    env.storage()
        .instance()
        .set(&DataKey::MinimumLiquidity, &amount);
}

// === Share ledger ===

pub fn get_total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

pub fn set_total_supply(env: &Env, amount: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &amount);
}

pub fn get_balance(env: &Env, account: &Address) -> Option<i128> {
    env.storage()
        .persistent()
        .get(&DataKey::Balance(account.clone()))
}

pub fn set_balance(env: &Env, account: &Address, amount: i128) {
    let key = DataKey::Balance(account.clone());
    env.storage().persistent().set(&key, &amount);
    extend_persistent_ttl(env, &key);
}

pub fn get_allowance(env: &Env, from: &Address, spender: &Address) -> Option<i128> {
    env.storage()
        .persistent()
        .get(&DataKey::Allowance(from.clone(), spender.clone()))
}

pub fn set_allowance(env: &Env, from: &Address, spender: &Address, amount: i128) {
    let key = DataKey::Allowance(from.clone(), spender.clone());
    env.storage().persistent().set(&key, &amount);
    extend_persistent_ttl(env, &key);
}

pub fn has_allowance(env: &Env, from: &Address, spender: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Allowance(from.clone(), spender.clone()))
}

// === Protocol fee bookkeeping ===

pub fn get_k_last(env: &Env) -> U256 {
    env.storage()
        .instance()
        .get(&DataKey::KLast)
        .unwrap_or_else(|| U256::from_u32(env, 0))
}

pub fn set_k_last(env: &Env, value: &U256) {
    env.storage().instance().set(&DataKey::KLast, value);
}

// === Price accumulators ===

pub fn get_price0_cumulative_last(env: &Env) -> U256 {
    env.storage()
        .instance()
        .get(&DataKey::Price0CumulativeLast)
        .unwrap_or_else(|| U256::from_u32(env, 0))
}

pub fn set_price0_cumulative_last(env: &Env, value: &U256) {
    env.storage()
        .instance()
        .set(&DataKey::Price0CumulativeLast, value);
}

pub fn get_price1_cumulative_last(env: &Env) -> U256 {
    env.storage()
        .instance()
        .get(&DataKey::Price1CumulativeLast)
        .unwrap_or_else(|| U256::from_u32(env, 0))
}

pub fn set_price1_cumulative_last(env: &Env, value: &U256) {
    env.storage()
        .instance()
        .set(&DataKey::Price1CumulativeLast, value);
}
