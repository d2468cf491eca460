#![no_std]

pub mod storage;

use amm_library::path::sort_tokens;
use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{
    contract, contractimpl, Address, Bytes, BytesN, Env, IntoVal, Symbol, Vec,
};

#[contract]
pub struct AmmFactory;

#[contractimpl]
impl AmmFactory {
    /// Initialize factory with the fee switch authority and the pair
    /// WASM hash used for deployments
    pub fn initialize(env: Env, fee_to_setter: Address, pair_wasm_hash: BytesN<32>) {
        if storage::has_fee_to_setter(&env) {
            panic!("Already initialized");
        }

        fee_to_setter.require_auth();

        storage::set_fee_to_setter(&env, &fee_to_setter);
        storage::set_pair_wasm_hash(&env, &pair_wasm_hash);
        env.storage()
            .instance()
            .set(&storage::DataKey::PairCount, &0u32);

        storage::extend_instance_ttl(&env);
    }

    /// Deploy and register the pair for a token set. One pair per
    /// unordered token set; a second creation attempt fails.
    /// Returns the pair contract address.
    pub fn create_pair(
        env: Env,
        token_a: Address,
        token_b: Address,
        minimum_liquidity: Option<i128>,
    ) -> Address {
        let (token0, token1) = sort_tokens(&token_a, &token_b);

        if storage::get_pair(&env, &token0, &token1).is_some() {
            panic!("Pair already exists");
        }

        let pair_wasm_hash = storage::get_pair_wasm_hash(&env);

        // Deterministic address per token set
        let mut salt_preimage = Bytes::new(&env);
        salt_preimage.append(&token0.clone().to_xdr(&env));
        salt_preimage.append(&token1.clone().to_xdr(&env));
        let salt = env.crypto().sha256(&salt_preimage);

        let pair = env
            .deployer()
            .with_current_contract(salt.to_bytes())
            .deploy_v2(pair_wasm_hash, ());

        init_pair(&env, &pair, &token0, &token1, &minimum_liquidity);
        storage::add_pair(&env, &token0, &token1, &pair);

        env.events().publish(
            (Symbol::new(&env, "pair_created"),),
            (token0, token1, pair.clone()),
        );

        storage::extend_instance_ttl(&env);
        pair
    }

    /// Get the pair for a token set, in either token order
    pub fn get_pair(env: Env, token_a: Address, token_b: Address) -> Option<Address> {
        storage::get_pair(&env, &token_a, &token_b)
    }

    /// Total number of pairs created
    pub fn all_pairs_length(env: Env) -> u32 {
        storage::extend_instance_ttl(&env);
        storage::get_pair_count(&env)
    }

    /// Pair address at a creation index
    pub fn get_nth_pair(env: Env, index: u32) -> Option<Address> {
        storage::get_pair_at(&env, index)
    }

    /// Get pairs with pagination
    /// Returns up to `limit` pairs starting from `start_index`
    /// Maximum limit is 50 to stay within Soroban's read entry limits
    pub fn get_pairs_paginated(env: Env, start_index: u32, limit: u32) -> Vec<Address> {
        let safe_limit = if limit > 50 { 50 } else { limit };

        let pair_count = storage::get_pair_count(&env);
        let end_index = start_index.saturating_add(safe_limit).min(pair_count);

        let mut pairs: Vec<Address> = Vec::new(&env);
        for i in start_index..end_index {
            if let Some(pair) = storage::get_pair_at(&env, i) {
                pairs.push_back(pair);
            }
        }
        pairs
    }

    /// Get all deployed pairs (for backward compatibility)
    /// WARNING: This may fail for large pair counts due to read limits.
    /// Use get_pairs_paginated for production code.
    pub fn get_all_pairs(env: Env) -> Vec<Address> {
        let pair_count = storage::get_pair_count(&env);
        let safe_count = if pair_count > 50 { 50 } else { pair_count };

        let mut pairs: Vec<Address> = Vec::new(&env);
        for i in 0..safe_count {
            if let Some(pair) = storage::get_pair_at(&env, i) {
                pairs.push_back(pair);
            }
        }
        pairs
    }

    /// Protocol fee recipient; None while the fee is switched off
    pub fn fee_to(env: Env) -> Option<Address> {
        storage::get_fee_to(&env)
    }

    /// Flip the protocol fee switch, fee-to-setter only
    pub fn set_fee_to(env: Env, fee_to: Option<Address>) {
        let setter = storage::get_fee_to_setter(&env);
        setter.require_auth();
        storage::set_fee_to(&env, &fee_to);
    }

    pub fn fee_to_setter(env: Env) -> Address {
        storage::get_fee_to_setter(&env)
    }

    /// Hand the fee switch authority to a new account
    pub fn set_fee_to_setter(env: Env, new_setter: Address) {
        let setter = storage::get_fee_to_setter(&env);
        setter.require_auth();
        storage::set_fee_to_setter(&env, &new_setter);
    }

    pub fn get_pair_wasm_hash(env: Env) -> BytesN<32> {
        storage::get_pair_wasm_hash(&env)
    }
}

// Pair initialization via invoke
fn init_pair(
    env: &Env,
    pair: &Address,
    token0: &Address,
    token1: &Address,
    minimum_liquidity: &Option<i128>,
) {
    env.invoke_contract::<()>(
        pair,
        &Symbol::new(env, "initialize"),
        (
            env.current_contract_address(),
            token0,
            token1,
            minimum_liquidity,
        )
            .into_val(env),
    );
}
