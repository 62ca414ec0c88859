use crate::Pool;
use clearing_types::{Q128_RESOLUTION, U256};

/// Fee growth per unit of liquidity accrued strictly inside [tick_lower, tick_upper).
///
/// The accumulators are free-running counters, so every subtraction wraps and
/// only differences between two readings are meaningful.
pub fn fee_growth_inside(
    fee_growth_global_x128: U256,
    lower_outside_x128: U256,
    upper_outside_x128: U256,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
) -> U256 {
    let below = if tick_current >= tick_lower {
        lower_outside_x128
    } else {
        fee_growth_global_x128.wrapping_sub(lower_outside_x128)
    };
    let above = if tick_current < tick_upper {
        upper_outside_x128
    } else {
        fee_growth_global_x128.wrapping_sub(upper_outside_x128)
    };
    fee_growth_global_x128
        .wrapping_sub(below)
        .wrapping_sub(above)
}

/// Fee growth inside a range for both pool tokens, as (token0, token1)
pub fn get_fee_growth_inside<P: Pool + ?Sized>(
    pool: &P,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
) -> (U256, U256) {
    let lower = pool.ticks(tick_lower);
    let upper = pool.ticks(tick_upper);
    (
        fee_growth_inside(
            pool.fee_growth_global_0_x128(),
            lower.fee_growth_outside_0_x128,
            upper.fee_growth_outside_0_x128,
            tick_lower,
            tick_upper,
            tick_current,
        ),
        fee_growth_inside(
            pool.fee_growth_global_1_x128(),
            lower.fee_growth_outside_1_x128,
            upper.fee_growth_outside_1_x128,
            tick_lower,
            tick_upper,
            tick_current,
        ),
    )
}

/// Growth added to the global accumulator when `fee_amount` is spread over `liquidity`
pub fn fee_growth_delta(fee_amount: u128, liquidity: u128) -> U256 {
    if liquidity == 0 {
        return U256::ZERO;
    }
    (U256::from(fee_amount) << Q128_RESOLUTION) / U256::from(liquidity)
}

/// floor(growth_delta * liquidity / 2^128), truncated to 128 bits
pub fn tokens_owed(growth_delta_x128: U256, liquidity: u128) -> u128 {
    let high = (growth_delta_x128 >> Q128_RESOLUTION).as_u128();
    let low = growth_delta_x128.as_u128();
    let low_part = (U256::from(low) * U256::from(liquidity)) >> Q128_RESOLUTION;
    high.wrapping_mul(liquidity).wrapping_add(low_part.as_u128())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearing_types::{MAX_TICK, MIN_TICK};

    fn growth(value: u128) -> U256 {
        U256::from(value) << Q128_RESOLUTION
    }

    #[test]
    fn test_current_tick_inside_range() {
        // 100 total, 10 below the lower tick, 30 above the upper tick
        let inside = fee_growth_inside(growth(100), growth(10), growth(30), -60, 60, 0);
        assert_eq!(inside, growth(60));
    }

    #[test]
    fn test_current_tick_below_range() {
        // Lower outside is tracked relative to the far side while below it
        let inside = fee_growth_inside(growth(100), growth(70), growth(40), 0, 60, -10);
        assert_eq!(inside, growth(30));
    }

    #[test]
    fn test_current_tick_above_range() {
        let inside = fee_growth_inside(growth(100), growth(20), growth(75), -60, 0, 10);
        assert_eq!(inside, growth(55));
    }

    #[test]
    fn test_upper_boundary_is_exclusive() {
        // At tick_upper the price has left the range
        let at_upper = fee_growth_inside(growth(100), growth(10), growth(60), -60, 60, 60);
        let above = fee_growth_inside(growth(100), growth(10), growth(60), -60, 60, 61);
        assert_eq!(at_upper, above);
        assert_eq!(at_upper, growth(50));
    }

    #[test]
    fn test_wraparound_is_modular() {
        // Global wrapped past zero after the outside snapshots were taken
        let global = U256::from(5u8);
        let lower = U256::MAX - U256::from(9u8);
        let upper = U256::ZERO;
        let inside = fee_growth_inside(global, lower, upper, -60, 60, 0);
        assert_eq!(inside, U256::from(15u8));
    }

    #[test]
    fn test_partition_sums_to_global() {
        // [MIN_TICK, a) + [a, b) + [b, MAX_TICK) covers the whole axis; nothing
        // accrues outside the domain bounds
        let global = U256::MAX - U256::from(1000u32);
        let outside_a = growth(7);
        let outside_b = U256::MAX - U256::from(3u8);
        let (a, b) = (-120, 120);
        for current in [-500, -120, 0, 119, 120, 500] {
            let left = fee_growth_inside(global, U256::ZERO, outside_a, MIN_TICK, a, current);
            let middle = fee_growth_inside(global, outside_a, outside_b, a, b, current);
            let right = fee_growth_inside(global, outside_b, U256::ZERO, b, MAX_TICK, current);
            assert_eq!(
                left.wrapping_add(middle).wrapping_add(right),
                global,
                "current tick {}",
                current
            );
        }
    }

    #[test]
    fn test_fee_growth_delta() {
        assert_eq!(fee_growth_delta(10, 0), U256::ZERO);
        assert_eq!(fee_growth_delta(10, 5), growth(2));
        // One unit of fee over three of liquidity
        assert_eq!(fee_growth_delta(1, 3), (U256::ONE << 128u32) / U256::from(3u8));
    }

    #[test]
    fn test_tokens_owed() {
        assert_eq!(tokens_owed(growth(2), 5), 10);
        // Fractional growth rounds down
        assert_eq!(tokens_owed(fee_growth_delta(1, 3), 3), 0);
        assert_eq!(tokens_owed(fee_growth_delta(10, 3), 3), 9);
        // Half a unit per liquidity
        assert_eq!(tokens_owed(U256::ONE << 127u32, 1_000_001), 500_000);
    }
}
