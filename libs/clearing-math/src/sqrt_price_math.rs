use crate::full_math::{div_u256, mul_div, mul_div_rounding_up, mul_div_u256, q96, to_u128};
use clearing_types::{Error, Q96};
use soroban_sdk::{Env, U256};

fn sort(sqrt_ratio_a_x96: u128, sqrt_ratio_b_x96: u128) -> (u128, u128) {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    } else {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96)
    }
}

/// Calculate amount0 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_x = L * (sqrt_pb - sqrt_pa) / (sqrt_pa * sqrt_pb)
pub fn get_amount0_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_lower == 0 {
        return Err(Error::DivisionByZero);
    }

    // (L << 96) * diff can reach 352 bits; divide the 256-bit L * diff first
    let numerator = U256::from_u128(env, liquidity)
        .mul(&U256::from_u128(env, sqrt_ratio_upper - sqrt_ratio_lower));
    let scaled = mul_div_u256(env, &numerator, Q96, sqrt_ratio_upper, round_up)?;
    let amount = div_u256(env, &scaled, &U256::from_u128(env, sqrt_ratio_lower), round_up)?;
    to_u128(&amount)
}

/// Calculate amount1 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_y = L * (sqrt_pb - sqrt_pa)
pub fn get_amount1_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, Error> {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if round_up {
        mul_div_rounding_up(env, liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    } else {
        mul_div(env, liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    }
}

/// Get next sqrt price from an input amount of token0 or token1
pub fn get_next_sqrt_price_from_input(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_in: u128,
    zero_for_one: bool,
) -> Result<u128, Error> {
    if sqrt_price_x96 == 0 || liquidity == 0 {
        return Err(Error::DivisionByZero);
    }

    // Round so the price never passes the exact target
    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Get next sqrt price from an output amount
pub fn get_next_sqrt_price_from_output(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_out: u128,
    zero_for_one: bool,
) -> Result<u128, Error> {
    if sqrt_price_x96 == 0 || liquidity == 0 {
        return Err(Error::DivisionByZero);
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_out, false)
    }
}

/// Calculate next sqrt price given a token0 amount
/// sqrt_price_next = L / (L / sqrt_price + amount)  [if add]
/// sqrt_price_next = L / (L / sqrt_price - amount)  [if remove]
fn get_next_sqrt_price_from_amount0_rounding_up(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, Error> {
    if amount == 0 {
        return Ok(sqrt_price_x96);
    }

    // L << 96 fits 224 bits
    let numerator1 = U256::from_u128(env, liquidity).mul(&q96(env));
    let reserve = numerator1.div(&U256::from_u128(env, sqrt_price_x96));
    let amount_256 = U256::from_u128(env, amount);

    let denominator = if add {
        reserve.add(&amount_256)
    } else {
        if reserve <= amount_256 {
            return Err(Error::SqrtPriceOutOfRange);
        }
        reserve.sub(&amount_256)
    };
    to_u128(&div_u256(env, &numerator1, &denominator, true)?)
}

/// Calculate next sqrt price given a token1 amount
/// sqrt_price_next = sqrt_price + amount / L  [if add]
/// sqrt_price_next = sqrt_price - amount / L  [if remove]
fn get_next_sqrt_price_from_amount1_rounding_down(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, Error> {
    if add {
        let quotient = mul_div(env, amount, Q96, liquidity)?;
        sqrt_price_x96.checked_add(quotient).ok_or(Error::Overflow)
    } else {
        let quotient = mul_div_rounding_up(env, amount, Q96, liquidity)?;
        if sqrt_price_x96 <= quotient {
            return Err(Error::SqrtPriceOutOfRange);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearing_types::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
    use soroban_sdk::Env;

    const ONE: u128 = 1_000_000_000_000_000_000;

    // === get_amount0_delta tests ===

    #[test]
    fn test_get_amount0_delta_price_one_to_four() {
        let env = Env::default();
        // L * (1/1 - 1/2) with sqrt prices 1 and 2
        assert_eq!(get_amount0_delta(&env, Q96, Q96 * 2, ONE, false), Ok(ONE / 2));
        assert_eq!(get_amount0_delta(&env, Q96, Q96 * 2, ONE, true), Ok(ONE / 2));
    }

    #[test]
    fn test_get_amount0_delta_rounding_and_order() {
        let env = Env::default();
        let sqrt_b = Q96 * 11 / 10;
        assert_eq!(
            get_amount0_delta(&env, Q96, sqrt_b, ONE, false),
            Ok(90909090909090909)
        );
        assert_eq!(
            get_amount0_delta(&env, sqrt_b, Q96, ONE, true),
            Ok(90909090909090910)
        );
    }

    #[test]
    fn test_get_amount0_delta_zero_range() {
        let env = Env::default();
        assert_eq!(get_amount0_delta(&env, Q96, Q96, ONE, true), Ok(0));
    }

    #[test]
    fn test_get_amount0_delta_wide_liquidity() {
        let env = Env::default();
        // (L << 96) exceeds 256 bits once multiplied by the range width
        let liquidity = u128::MAX / 4;
        let amount = get_amount0_delta(&env, MAX_SQRT_RATIO / 2, MAX_SQRT_RATIO, liquidity, false)
            .unwrap();
        // L * (1/P - 2/P) * 2^96 where P = MAX_SQRT_RATIO / 2^96
        assert!(amount > 0 && amount < liquidity);
    }

    #[test]
    fn test_get_amount0_delta_overflow() {
        let env = Env::default();
        assert_eq!(
            get_amount0_delta(&env, MIN_SQRT_RATIO, MAX_SQRT_RATIO, u128::MAX, false),
            Err(Error::Overflow)
        );
    }

    #[test]
    fn test_get_amount0_delta_zero_sqrt_ratio() {
        let env = Env::default();
        assert_eq!(
            get_amount0_delta(&env, 0, Q96, ONE, false),
            Err(Error::DivisionByZero)
        );
    }

    // === get_amount1_delta tests ===

    #[test]
    fn test_get_amount1_delta_basic() {
        let env = Env::default();
        assert_eq!(get_amount1_delta(&env, Q96, Q96 * 2, ONE, false), Ok(ONE));
        assert_eq!(get_amount1_delta(&env, Q96 * 2, Q96, ONE, true), Ok(ONE));
    }

    #[test]
    fn test_get_amount1_delta_rounding() {
        let env = Env::default();
        let sqrt_b = Q96 * 11 / 10;
        assert_eq!(
            get_amount1_delta(&env, Q96, sqrt_b, ONE, false),
            Ok(99999999999999999)
        );
        assert_eq!(
            get_amount1_delta(&env, Q96, sqrt_b, ONE, true),
            Ok(100000000000000000)
        );
    }

    // === next sqrt price tests ===

    #[test]
    fn test_get_next_sqrt_price_from_input() {
        let env = Env::default();
        assert_eq!(
            get_next_sqrt_price_from_input(&env, Q96, ONE, ONE / 10, true),
            Ok(72025602285694852357767227579)
        );
        assert_eq!(
            get_next_sqrt_price_from_input(&env, Q96, ONE, ONE / 10, false),
            Ok(87150978765690771352898345369)
        );
    }

    #[test]
    fn test_get_next_sqrt_price_from_output() {
        let env = Env::default();
        assert_eq!(
            get_next_sqrt_price_from_output(&env, Q96, ONE, ONE / 10, true),
            Ok(71305346262837903834189555302)
        );
        assert_eq!(
            get_next_sqrt_price_from_output(&env, Q96, ONE, ONE / 10, false),
            Ok(88031291682515930659493278152)
        );
    }

    #[test]
    fn test_get_next_sqrt_price_zero_amount() {
        let env = Env::default();
        for zero_for_one in [true, false] {
            assert_eq!(
                get_next_sqrt_price_from_input(&env, Q96, ONE, 0, zero_for_one),
                Ok(Q96)
            );
        }
    }

    #[test]
    fn test_get_next_sqrt_price_invalid_inputs() {
        let env = Env::default();
        assert_eq!(
            get_next_sqrt_price_from_input(&env, Q96, 0, ONE, true),
            Err(Error::DivisionByZero)
        );
        assert_eq!(
            get_next_sqrt_price_from_output(&env, 0, ONE, ONE, true),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_output_exceeding_reserves_fails() {
        let env = Env::default();
        // Virtual token1 reserve at price 1 is L
        assert_eq!(
            get_next_sqrt_price_from_output(&env, Q96, ONE, ONE, true),
            Err(Error::SqrtPriceOutOfRange)
        );
        assert_eq!(
            get_next_sqrt_price_from_output(&env, Q96, ONE, ONE, false),
            Err(Error::SqrtPriceOutOfRange)
        );
    }

    #[test]
    fn test_input_then_delta_is_conservative() {
        let env = Env::default();
        let amount_in = 123_456_789_000_000_000u128;
        let next = get_next_sqrt_price_from_input(&env, Q96, ONE, amount_in, true).unwrap();
        // Rounding the price up means the move never needs more than was supplied
        let needed = get_amount0_delta(&env, next, Q96, ONE, true).unwrap();
        assert!(needed <= amount_in);
    }
}
