use clearing_types::{Error, Q96};
use soroban_sdk::{Env, U256};

/// 2^128 as U256
pub(crate) fn q128(env: &Env) -> U256 {
    U256::from_u128(env, 1u128 << 64).mul(&U256::from_u128(env, 1u128 << 64))
}

pub(crate) fn q96(env: &Env) -> U256 {
    U256::from_u128(env, Q96)
}

/// 2^256 - 1
pub(crate) fn u256_max(env: &Env) -> U256 {
    let high = U256::from_u128(env, u128::MAX);
    high.mul(&q128(env)).add(&U256::from_u128(env, u128::MAX))
}

/// Narrow a U256 to u128
pub fn to_u128(value: &U256) -> Result<u128, Error> {
    value.to_u128().ok_or(Error::Overflow)
}

/// n / d, rounded up when `round_up` and the division is inexact
pub fn div_u256(env: &Env, n: &U256, d: &U256, round_up: bool) -> Result<U256, Error> {
    let zero = U256::from_u32(env, 0);
    if *d == zero {
        return Err(Error::DivisionByZero);
    }
    let quotient = n.div(d);
    if round_up && n.rem_euclid(d) > zero {
        // quotient < MAX whenever a remainder exists
        Ok(quotient.add(&U256::from_u32(env, 1)))
    } else {
        Ok(quotient)
    }
}

/// floor or ceil of (n * m) / d where n * m may exceed 256 bits.
///
/// Splits n into q * d + r so the only wide product is r * m, which stays
/// below d * m < 2^256. Fails with `Overflow` only if the result itself does
/// not fit 256 bits.
pub fn mul_div_u256(env: &Env, n: &U256, m: u128, d: u128, round_up: bool) -> Result<U256, Error> {
    if d == 0 {
        return Err(Error::DivisionByZero);
    }
    let zero = U256::from_u32(env, 0);
    let m_256 = U256::from_u128(env, m);
    let d_256 = U256::from_u128(env, d);

    let quotient = n.div(&d_256);
    let remainder = n.rem_euclid(&d_256);
    let tail = div_u256(env, &remainder.mul(&m_256), &d_256, round_up)?;

    if m == 0 || quotient == zero {
        return Ok(tail);
    }
    let max = u256_max(env);
    if quotient > max.div(&m_256) {
        return Err(Error::Overflow);
    }
    let head = quotient.mul(&m_256);
    if head > max.sub(&tail) {
        return Err(Error::Overflow);
    }
    Ok(head.add(&tail))
}

/// Multiply and divide with 256-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> Result<u128, Error> {
    if denominator == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    let result = product.div(&U256::from_u128(env, denominator));
    to_u128(&result)
}

/// Multiply and divide with 256-bit intermediate precision (rounds up)
/// Returns ceil((a * b) / denominator)
pub fn mul_div_rounding_up(env: &Env, a: u128, b: u128, denominator: u128) -> Result<u128, Error> {
    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    let result = div_u256(env, &product, &U256::from_u128(env, denominator), true)?;
    to_u128(&result)
}

/// Unsigned division with rounding up
pub fn div_rounding_up(a: u128, b: u128) -> Result<u128, Error> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    Ok((a - 1) / b + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::Env;

    // === mul_div tests ===

    #[test]
    fn test_mul_div_basic() {
        let env = Env::default();
        assert_eq!(mul_div(&env, 10, 20, 5), Ok(40));
    }

    #[test]
    fn test_mul_div_phantom_overflow() {
        let env = Env::default();
        // a * b overflows u128 but the quotient fits
        let large = 1u128 << 100;
        assert_eq!(mul_div(&env, large, large, large), Ok(large));
        let max = u128::MAX;
        assert_eq!(mul_div(&env, max, max, max), Ok(max));
    }

    #[test]
    fn test_mul_div_rounds_down() {
        let env = Env::default();
        assert_eq!(mul_div(&env, 1, 1, 2), Ok(0));
        assert_eq!(mul_div(&env, 3, 1, 2), Ok(1));
        assert_eq!(mul_div(&env, 5, 1, 3), Ok(1));
    }

    #[test]
    fn test_mul_div_result_overflow() {
        let env = Env::default();
        let large = 1u128 << 100;
        assert_eq!(mul_div(&env, large, large, 1), Err(Error::Overflow));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        let env = Env::default();
        assert_eq!(mul_div(&env, 10, 20, 0), Err(Error::DivisionByZero));
        assert_eq!(
            mul_div_rounding_up(&env, 10, 20, 0),
            Err(Error::DivisionByZero)
        );
    }

    // === mul_div_rounding_up tests ===

    #[test]
    fn test_mul_div_rounding_up_exact() {
        let env = Env::default();
        assert_eq!(mul_div_rounding_up(&env, 10, 20, 5), Ok(40));
    }

    #[test]
    fn test_mul_div_rounding_up_vs_down_difference() {
        let env = Env::default();
        // 77 / 13 = 5.92
        assert_eq!(mul_div(&env, 7, 11, 13), Ok(5));
        assert_eq!(mul_div_rounding_up(&env, 7, 11, 13), Ok(6));
    }

    #[test]
    fn test_mul_div_rounding_up_overflows_at_boundary() {
        let env = Env::default();
        // ceil((MAX * MAX) / (MAX - 1)) = MAX + 2
        assert_eq!(
            mul_div_rounding_up(&env, u128::MAX, u128::MAX, u128::MAX - 1),
            Err(Error::Overflow)
        );
    }

    // === div_rounding_up tests ===

    #[test]
    fn test_div_rounding_up() {
        assert_eq!(div_rounding_up(9, 3), Ok(3));
        assert_eq!(div_rounding_up(10, 3), Ok(4));
        assert_eq!(div_rounding_up(1, 2), Ok(1));
        assert_eq!(div_rounding_up(0, 5), Ok(0));
        assert_eq!(div_rounding_up(u128::MAX - 1, 1), Ok(u128::MAX - 1));
        assert_eq!(div_rounding_up(10, 0), Err(Error::DivisionByZero));
    }

    // === wide helpers ===

    #[test]
    fn test_mul_div_u256_beyond_256_bit_product() {
        let env = Env::default();
        // (2^200 * 2^100) / 2^120 = 2^180, product is 300 bits wide
        let n = U256::from_u128(&env, 1u128 << 100).mul(&U256::from_u128(&env, 1u128 << 100));
        let result = mul_div_u256(&env, &n, 1u128 << 100, 1u128 << 120, false).unwrap();
        let expected = U256::from_u128(&env, 1u128 << 90).mul(&U256::from_u128(&env, 1u128 << 90));
        assert_eq!(result, expected);
    }

    #[test]
    fn test_mul_div_u256_rounding() {
        let env = Env::default();
        let n = U256::from_u32(&env, 7);
        assert_eq!(
            mul_div_u256(&env, &n, 11, 13, false).unwrap(),
            U256::from_u32(&env, 5)
        );
        assert_eq!(
            mul_div_u256(&env, &n, 11, 13, true).unwrap(),
            U256::from_u32(&env, 6)
        );
    }

    #[test]
    fn test_mul_div_u256_overflow() {
        let env = Env::default();
        let max = u256_max(&env);
        assert_eq!(mul_div_u256(&env, &max, 3, 2, false), Err(Error::Overflow));
        assert_eq!(
            mul_div_u256(&env, &max, 1, 0, false),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_div_u256_rounding() {
        let env = Env::default();
        let n = U256::from_u32(&env, 10);
        let d = U256::from_u32(&env, 4);
        assert_eq!(div_u256(&env, &n, &d, false).unwrap(), U256::from_u32(&env, 2));
        assert_eq!(div_u256(&env, &n, &d, true).unwrap(), U256::from_u32(&env, 3));
        assert_eq!(
            div_u256(&env, &n, &U256::from_u32(&env, 0), true),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_accuracy_at_large_scale() {
        let env = Env::default();
        let q96 = 1u128 << 96;
        let price = q96 + (q96 / 1000);
        let amount = 1_000_000_000_000u128;

        let result = mul_div(&env, amount, price, q96).unwrap();
        let expected = 1_001_000_000_000u128;
        assert!(result.abs_diff(expected) <= 1);
    }
}
