use amm_types::{FEE_DENOMINATOR, FEE_NUMERATOR};
use soroban_fixed_point_math::SorobanFixedPoint;
use soroban_sdk::Env;

use crate::full_math;

/// Equivalent amount of the other asset at the current reserve ratio,
/// without any fee. Used when topping up liquidity.
pub fn quote(env: &Env, amount_a: i128, reserve_a: i128, reserve_b: i128) -> i128 {
    if amount_a <= 0 {
        panic!("Insufficient amount");
    }
    if reserve_a <= 0 || reserve_b <= 0 {
        panic!("Insufficient liquidity");
    }
    amount_a.fixed_mul_floor(env, &reserve_b, &reserve_a)
}

/// Maximum output for an exact input, after the fee on the input side
/// (rounds down, in the pair's favor). Intermediates are 256-bit so
/// any i128 amounts and reserves are accepted.
pub fn get_amount_out(env: &Env, amount_in: i128, reserve_in: i128, reserve_out: i128) -> i128 {
    if amount_in <= 0 {
        panic!("Insufficient input amount");
    }
    if reserve_in <= 0 || reserve_out <= 0 {
        panic!("Insufficient liquidity");
    }
    let amount_in_with_fee = full_math::u256_mul(env, amount_in, FEE_NUMERATOR);
    let numerator = amount_in_with_fee.mul(&full_math::u256_from_i128(env, reserve_out));
    let denominator =
        full_math::u256_mul(env, reserve_in, FEE_DENOMINATOR).add(&amount_in_with_fee);
    full_math::i128_from_u256(env, &numerator.div(&denominator))
}

/// Minimum input for an exact output (rounds up, in the pair's favor)
pub fn get_amount_in(env: &Env, amount_out: i128, reserve_in: i128, reserve_out: i128) -> i128 {
    if amount_out <= 0 {
        panic!("Insufficient output amount");
    }
    if reserve_in <= 0 || reserve_out <= amount_out {
        panic!("Insufficient liquidity");
    }
    let numerator = full_math::u256_mul(env, reserve_in, FEE_DENOMINATOR)
        .mul(&full_math::u256_from_i128(env, amount_out));
    let denominator = full_math::u256_mul(env, reserve_out - amount_out, FEE_NUMERATOR);
    full_math::i128_from_u256(env, &numerator.div(&denominator)) + 1
}
