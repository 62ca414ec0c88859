use crate::full_math::{mul_div, mul_div_u256, q96, to_u128};
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use clearing_types::{Error, Q96};
use soroban_sdk::{Env, U256};

fn sort(sqrt_ratio_a_x96: u128, sqrt_ratio_b_x96: u128) -> (u128, u128) {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    } else {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96)
    }
}

/// Largest liquidity the two amounts support over a price range.
///
/// Below the range only amount0 counts, above it only amount1, and inside it
/// the scarcer side binds. A zero result is returned as-is.
pub fn get_liquidity_for_amounts(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount0: u128,
    amount1: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= sqrt_ratio_lower {
        get_liquidity_for_amount0(env, sqrt_ratio_lower, sqrt_ratio_upper, amount0)
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        let liquidity0 = get_liquidity_for_amount0(env, sqrt_ratio_x96, sqrt_ratio_upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(env, sqrt_ratio_lower, sqrt_ratio_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(env, sqrt_ratio_lower, sqrt_ratio_upper, amount1)
    }
}

/// L = amount0 * sqrt_pa * sqrt_pb / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount0(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount0: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_lower == sqrt_ratio_upper {
        return Err(Error::DivisionByZero);
    }

    // sqrt_pa * sqrt_pb / 2^96 can exceed 128 bits near the top of the domain
    let intermediate = U256::from_u128(env, sqrt_ratio_lower)
        .mul(&U256::from_u128(env, sqrt_ratio_upper))
        .div(&q96(env));
    let liquidity = mul_div_u256(
        env,
        &intermediate,
        amount0,
        sqrt_ratio_upper - sqrt_ratio_lower,
        false,
    )?;
    to_u128(&liquidity)
}

/// L = amount1 / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount1(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount1: u128,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    mul_div(env, amount1, Q96, sqrt_ratio_upper - sqrt_ratio_lower)
}

/// Token amounts represented by `liquidity` at the current price, rounded down
pub fn get_amounts_for_liquidity(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
) -> Result<(u128, u128), Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_ratio_x96 <= sqrt_ratio_lower {
        let amount0 = get_amount0_for_liquidity(env, sqrt_ratio_lower, sqrt_ratio_upper, liquidity)?;
        Ok((amount0, 0))
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        let amount0 = get_amount0_for_liquidity(env, sqrt_ratio_x96, sqrt_ratio_upper, liquidity)?;
        let amount1 = get_amount1_for_liquidity(env, sqrt_ratio_lower, sqrt_ratio_x96, liquidity)?;
        Ok((amount0, amount1))
    } else {
        let amount1 = get_amount1_for_liquidity(env, sqrt_ratio_lower, sqrt_ratio_upper, liquidity)?;
        Ok((0, amount1))
    }
}

/// Token0 held by `liquidity` across the range, rounded down
pub fn get_amount0_for_liquidity(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
) -> Result<u128, Error> {
    get_amount0_delta(env, sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, false)
}

/// Token1 held by `liquidity` across the range, rounded down
pub fn get_amount1_for_liquidity(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
) -> Result<u128, Error> {
    get_amount1_delta(env, sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, false)
}

/// Add signed liquidity delta to unsigned liquidity
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, Error> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(Error::LiquidityUnderflow)
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(Error::Overflow)
    }
}
