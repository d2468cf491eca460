//! Swap execution. Outputs are transferred optimistically, the
//! optional callback runs, and the fee-adjusted constant-product
//! check over the re-read balances decides whether the whole
//! invocation commits.

use amm_library::full_math;
use amm_types::{SwapCallbackClient, TokenClient, FEE_DENOMINATOR};
use soroban_sdk::{Address, Env, Symbol, U256};

use crate::{storage, update_reserves};

// Fee charged on input amounts: 3 parts per FEE_DENOMINATOR
const FEE_PER_MILLE: i128 = 3;

pub fn execute_swap(
    env: &Env,
    sender: &Address,
    amount0_out: i128,
    amount1_out: i128,
    to: &Address,
    callback: &Option<Address>,
) {
    if amount0_out < 0 || amount1_out < 0 {
        panic!("Non-negative value required");
    }
    if amount0_out == 0 && amount1_out == 0 {
        panic!("Insufficient output amount");
    }

    let config = storage::get_config(env);
    let reserves = storage::get_reserves(env);
    if amount0_out >= reserves.reserve0 || amount1_out >= reserves.reserve1 {
        panic!("Insufficient liquidity");
    }
    if to == &config.token0 || to == &config.token1 {
        panic!("Invalid to");
    }

    let current = env.current_contract_address();
    let token0 = TokenClient::new(env, &config.token0);
    let token1 = TokenClient::new(env, &config.token1);

    // Optimistic transfers; the K check below unwinds them on failure
    if amount0_out > 0 {
        token0.transfer(&current, to, &amount0_out);
    }
    if amount1_out > 0 {
        token1.transfer(&current, to, &amount1_out);
    }

    if let Some(callback) = callback {
        SwapCallbackClient::new(env, callback).swap_call(sender, &amount0_out, &amount1_out);
    }

    let balance0 = token0.balance(&current).unwrap_or(0);
    let balance1 = token1.balance(&current).unwrap_or(0);

    let amount0_in = received(balance0, reserves.reserve0, amount0_out);
    let amount1_in = received(balance1, reserves.reserve1, amount1_out);
    if amount0_in == 0 && amount1_in == 0 {
        panic!("Insufficient input amount");
    }

    // (b0*1000 - 3*in0) * (b1*1000 - 3*in1) >= r0 * r1 * 1000^2
    let adjusted0 = fee_adjusted_balance(env, balance0, amount0_in);
    let adjusted1 = fee_adjusted_balance(env, balance1, amount1_in);
    let k_old = full_math::u256_mul(env, reserves.reserve0, reserves.reserve1)
        .mul(&U256::from_u128(env, (FEE_DENOMINATOR * FEE_DENOMINATOR) as u128));
    if adjusted0.mul(&adjusted1).lt(&k_old) {
        panic!("K invariant violated");
    }

    update_reserves(env, balance0, balance1);

    env.events().publish(
        (Symbol::new(env, "swap_tokens"), sender.clone(), to.clone()),
        (amount0_in, amount1_in, amount0_out, amount1_out),
    );
}

fn received(balance: i128, reserve: i128, amount_out: i128) -> i128 {
    let expected = reserve - amount_out;
    if balance > expected {
        balance - expected
    } else {
        0
    }
}

fn fee_adjusted_balance(env: &Env, balance: i128, amount_in: i128) -> U256 {
    full_math::u256_mul(env, balance, FEE_DENOMINATOR)
        .sub(&full_math::u256_mul(env, amount_in, FEE_PER_MILLE))
}
