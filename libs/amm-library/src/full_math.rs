use soroban_sdk::{Env, U256};

/// Multiply and divide with 256-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(env: &Env, a: i128, b: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        panic!("Division by zero");
    }

    let product = u256_mul(env, a, b);
    let result = product.div(&u256_from_i128(env, denominator));

    i128_from_u256(env, &result)
}

/// 256-bit product of two non-negative i128 values
pub fn u256_mul(env: &Env, a: i128, b: i128) -> U256 {
    u256_from_i128(env, a).mul(&u256_from_i128(env, b))
}

/// Integer square root (floor) by Newton iteration.
/// The result of any product of two i128 values fits in i128.
pub fn sqrt(env: &Env, value: &U256) -> i128 {
    let zero = U256::from_u32(env, 0);
    if value.eq(&zero) {
        return 0;
    }

    let two = U256::from_u32(env, 2);
    let mut x = value.clone();
    let mut y = value.add(&U256::from_u32(env, 1)).div(&two);
    while y.lt(&x) {
        x = y;
        y = x.add(&value.div(&x)).div(&two);
    }

    i128_from_u256(env, &x)
}

pub fn u256_from_i128(env: &Env, value: i128) -> U256 {
    if value < 0 {
        panic!("Negative value in unsigned math");
    }
    U256::from_u128(env, value as u128)
}

/// Convert U256 to i128, panics if overflow
pub fn i128_from_u256(env: &Env, value: &U256) -> i128 {
    let max_i128 = U256::from_u128(env, i128::MAX as u128);
    if value.gt(&max_i128) {
        panic!("U256 overflow when converting to i128");
    }
    value.to_u128().unwrap() as i128
}
