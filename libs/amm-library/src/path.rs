use amm_types::{PairClient, Reserves};
use soroban_sdk::{Address, Env, IntoVal, Symbol, Vec};

use crate::swap_math::{get_amount_in, get_amount_out};

/// Canonical (token0, token1) ordering by address
pub fn sort_tokens(token_a: &Address, token_b: &Address) -> (Address, Address) {
    if token_a == token_b {
        panic!("Identical tokens");
    }
    if token_a < token_b {
        (token_a.clone(), token_b.clone())
    } else {
        (token_b.clone(), token_a.clone())
    }
}

/// Look up the pair for a token set in the factory registry
pub fn pair_for(env: &Env, factory: &Address, token_a: &Address, token_b: &Address) -> Address {
    let pair: Option<Address> = env.invoke_contract(
        factory,
        &Symbol::new(env, "get_pair"),
        (token_a, token_b).into_val(env),
    );
    match pair {
        Some(pair) => pair,
        None => panic!("No pair found"),
    }
}

/// Reserves of a pair, returned in (token_a, token_b) order rather
/// than the pair's canonical order
pub fn get_reserves(
    env: &Env,
    factory: &Address,
    token_a: &Address,
    token_b: &Address,
) -> (i128, i128) {
    let (token0, _) = sort_tokens(token_a, token_b);
    let pair = pair_for(env, factory, token_a, token_b);
    let reserves: Reserves = PairClient::new(env, &pair).get_reserves();
    if token_a == &token0 {
        (reserves.reserve0, reserves.reserve1)
    } else {
        (reserves.reserve1, reserves.reserve0)
    }
}

/// Chain `get_amount_out` along a path; element i is the amount
/// entering hop i, the last element is the final output
pub fn get_amounts_out(
    env: &Env,
    factory: &Address,
    amount_in: i128,
    path: &Vec<Address>,
) -> Vec<i128> {
    if path.len() < 2 {
        panic!("Invalid path");
    }

    let mut amounts = Vec::new(env);
    amounts.push_back(amount_in);
    for i in 0..(path.len() - 1) {
        let token_in = path.get(i).unwrap();
        let token_out = path.get(i + 1).unwrap();
        let (reserve_in, reserve_out) = get_reserves(env, factory, &token_in, &token_out);
        let amount = amounts.get(i).unwrap();
        amounts.push_back(get_amount_out(env, amount, reserve_in, reserve_out));
    }
    amounts
}

/// Chain `get_amount_in` backwards along a path; the first element is
/// the required input, the last is the requested output
pub fn get_amounts_in(
    env: &Env,
    factory: &Address,
    amount_out: i128,
    path: &Vec<Address>,
) -> Vec<i128> {
    if path.len() < 2 {
        panic!("Invalid path");
    }

    let mut amounts = Vec::new(env);
    amounts.push_back(amount_out);
    for i in (1..path.len()).rev() {
        let token_in = path.get(i - 1).unwrap();
        let token_out = path.get(i).unwrap();
        let (reserve_in, reserve_out) = get_reserves(env, factory, &token_in, &token_out);
        let amount = amounts.get(0).unwrap();
        amounts.push_front(get_amount_in(env, amount, reserve_in, reserve_out));
    }
    amounts
}
