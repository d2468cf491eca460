#![no_std]

use soroban_sdk::{contractclient, contracttype, Address, Env, String, U256};

/// Swap fee: 3 per mille, charged on input amounts
pub const FEE_NUMERATOR: i128 = 997;
pub const FEE_DENOMINATOR: i128 = 1000;

/// Shares locked forever on the first mint of a pair, unless the
/// factory caller overrides it at pair creation
pub const DEFAULT_MINIMUM_LIQUIDITY: i128 = 1000;

/// Token metadata set at initialization
#[contracttype]
#[derive(Clone)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Immutable pair configuration (token0 < token1 by address order)
#[contracttype]
#[derive(Clone)]
pub struct PairConfig {
    pub factory: Address,
    pub token0: Address,
    pub token1: Address,
}

/// Cached reserves plus the timestamp of the last reserve update,
/// used by the cumulative price accumulators
#[contracttype]
#[derive(Clone)]
pub struct Reserves {
    pub reserve0: i128,
    pub reserve1: i128,
    pub block_timestamp_last: u64,
}

/// Fungible token surface the pair and router call into.
/// `balance` and `allowance` are None for accounts the token has
/// never seen, which is distinct from a recorded zero.
#[contractclient(name = "TokenClient")]
pub trait TokenInterface {
    fn meta(env: Env) -> TokenMetadata;
    fn total_supply(env: Env) -> i128;
    fn balance(env: Env, account: Address) -> Option<i128>;
    fn allowance(env: Env, from: Address, spender: Address) -> Option<i128>;
    fn transfer(env: Env, from: Address, to: Address, amount: i128);
    fn transfer_allowance(env: Env, spender: Address, from: Address, to: Address, amount: i128);
    fn create_allowance(env: Env, from: Address, spender: Address, amount: i128);
    fn change_allowance(env: Env, from: Address, spender: Address, delta: i128);
    fn reset_allowance(env: Env, from: Address, spender: Address);
    fn mint(env: Env, to: Address, amount: i128);
    fn burn(env: Env, from: Address, amount: i128);
}

/// Pair surface the router calls into. A pair is itself a fungible
/// token for its liquidity shares, hence the overlap with
/// `TokenInterface`.
#[contractclient(name = "PairClient")]
pub trait PairInterface {
    fn token0(env: Env) -> Address;
    fn token1(env: Env) -> Address;
    fn factory(env: Env) -> Address;
    fn minimum_liquidity(env: Env) -> i128;
    fn get_reserves(env: Env) -> Reserves;
    fn k_last(env: Env) -> U256;
    fn price0_cumulative_last(env: Env) -> U256;
    fn price1_cumulative_last(env: Env) -> U256;
    fn mint(env: Env, sender: Address, to: Address) -> i128;
    fn burn(env: Env, sender: Address, to: Address) -> (i128, i128);
    fn swap(
        env: Env,
        sender: Address,
        amount0_out: i128,
        amount1_out: i128,
        to: Address,
        callback: Option<Address>,
    );
    fn skim(env: Env, to: Address);
    fn sync(env: Env);
    fn total_supply(env: Env) -> i128;
    fn balance(env: Env, account: Address) -> Option<i128>;
    fn allowance(env: Env, from: Address, spender: Address) -> Option<i128>;
    fn transfer(env: Env, from: Address, to: Address, amount: i128);
    fn transfer_allowance(env: Env, spender: Address, from: Address, to: Address, amount: i128);
    fn create_allowance(env: Env, from: Address, spender: Address, amount: i128);
    fn change_allowance(env: Env, from: Address, spender: Address, delta: i128);
    fn reset_allowance(env: Env, from: Address, spender: Address);
}

/// Contract invoked by the pair mid-swap when a callback address is
/// given. The receiver must leave the pair whole before returning.
#[contractclient(name = "SwapCallbackClient")]
pub trait SwapCallback {
    fn swap_call(env: Env, sender: Address, amount0_out: i128, amount1_out: i128);
}
