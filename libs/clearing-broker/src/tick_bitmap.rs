use crate::Pool;
use clearing_types::{Error, MAX_TICK, MIN_TICK, U256};

/// Ticks per bitmap word
const WORD_BITS: i32 = 256;

/// Tick index divided by spacing, rounded toward negative infinity
pub fn compress(tick: i32, tick_spacing: i32) -> Result<i32, Error> {
    if tick_spacing <= 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(tick.div_euclid(tick_spacing))
}

/// Word index and bit index of a compressed tick
pub fn position(compressed: i32) -> Result<(i16, u8), Error> {
    let word_pos =
        i16::try_from(compressed.div_euclid(WORD_BITS)).map_err(|_| Error::TickOutOfRange)?;
    Ok((word_pos, compressed.rem_euclid(WORD_BITS) as u8))
}

fn check_tick(tick: i32) -> Result<(), Error> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Error::TickOutOfRange);
    }
    Ok(())
}

/// Word index and single-bit mask to XOR into that word to flip `tick`
pub fn flip_tick(tick: i32, tick_spacing: i32) -> Result<(i16, U256), Error> {
    if tick_spacing <= 0 {
        return Err(Error::DivisionByZero);
    }
    check_tick(tick)?;
    if tick % tick_spacing != 0 {
        return Err(Error::TickNotAligned);
    }
    let (word_pos, bit_pos) = position(tick / tick_spacing)?;
    Ok((word_pos, U256::ONE << u32::from(bit_pos)))
}

/// Next initialized tick in the same bitmap word as `tick`.
///
/// Searching left (`lte`) considers `tick` itself and everything below it in
/// the word; searching right starts at the tick after `tick`. When the word
/// has no set bit in the searched direction, the word's boundary tick is
/// returned with `initialized = false` and the caller continues from there.
/// That boundary may lie past the tick bounds; `tick` itself may not.
pub fn next_initialized_tick_within_one_word<P: Pool + ?Sized>(
    pool: &P,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), Error> {
    check_tick(tick)?;
    let compressed = compress(tick, tick_spacing)?;

    let (compressed, next) = if lte {
        let (word_pos, bit_pos) = position(compressed)?;
        (compressed, search_left(pool.tick_bitmap(word_pos), bit_pos))
    } else {
        let compressed = compressed.checked_add(1).ok_or(Error::Overflow)?;
        let (word_pos, bit_pos) = position(compressed)?;
        (compressed, search_right(pool.tick_bitmap(word_pos), bit_pos))
    };

    let (offset, initialized) = next;
    let next_tick = compressed
        .checked_add(offset)
        .and_then(|next| next.checked_mul(tick_spacing))
        .ok_or(Error::Overflow)?;
    Ok((next_tick, initialized))
}

/// Offset from `bit_pos` to the highest set bit at or below it
fn search_left(word: U256, bit_pos: u8) -> (i32, bool) {
    let bit = U256::ONE << u32::from(bit_pos);
    let masked = word & (bit - U256::ONE + bit);
    if masked == U256::ZERO {
        return (-i32::from(bit_pos), false);
    }
    let msb = 255 - masked.leading_zeros() as i32;
    (msb - i32::from(bit_pos), true)
}

/// Offset from `bit_pos` to the lowest set bit at or above it
fn search_right(word: U256, bit_pos: u8) -> (i32, bool) {
    let masked = word & !((U256::ONE << u32::from(bit_pos)) - U256::ONE);
    if masked == U256::ZERO {
        return (255 - i32::from(bit_pos), false);
    }
    let lsb = masked.trailing_zeros() as i32;
    (lsb - i32::from(bit_pos), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{unmetered_env, MemoryPool};
    use clearing_types::Q96;
    use soroban_sdk::Env;

    fn pool_with_ticks(env: &Env, tick_spacing_fee: u32, ticks: &[i32]) -> MemoryPool {
        let mut pool = MemoryPool::with_generated_tokens(env, tick_spacing_fee, Q96).unwrap();
        for tick in ticks {
            pool.flip_tick(*tick).unwrap();
        }
        pool
    }

    #[test]
    fn test_compress_rounds_toward_negative_infinity() {
        assert_eq!(compress(-1, 10), Ok(-1));
        assert_eq!(compress(-10, 10), Ok(-1));
        assert_eq!(compress(-11, 10), Ok(-2));
        assert_eq!(compress(19, 10), Ok(1));
        assert_eq!(compress(5, 0), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_position_across_zero() {
        assert_eq!(position(0), Ok((0, 0)));
        assert_eq!(position(255), Ok((0, 255)));
        assert_eq!(position(256), Ok((1, 0)));
        assert_eq!(position(-1), Ok((-1, 255)));
        assert_eq!(position(-256), Ok((-1, 0)));
        assert_eq!(position(-257), Ok((-2, 255)));
        // Word indexes past i16 are not wrapped
        assert_eq!(position(-32768 * 256), Ok((-32768, 0)));
        assert_eq!(position(32768 * 256), Err(Error::TickOutOfRange));
    }

    #[test]
    fn test_flip_tick_requires_alignment() {
        assert_eq!(flip_tick(15, 10), Err(Error::TickNotAligned));
        assert_eq!(flip_tick(MAX_TICK + 4, 10), Err(Error::TickOutOfRange));
        let (word_pos, mask) = flip_tick(-10, 10).unwrap();
        assert_eq!(word_pos, -1);
        assert_eq!(mask, U256::ONE << 255u32);
    }

    #[test]
    fn test_search_left_finds_tick_at_or_below() {
        let env = unmetered_env();
        // Fee 500 uses spacing 10
        let pool = pool_with_ticks(&env, 500, &[-2000, -50, 70, 780]);

        assert_eq!(next_initialized_tick_within_one_word(&pool, 78, 10, true), Ok((70, true)));
        // The starting tick counts when searching left
        assert_eq!(next_initialized_tick_within_one_word(&pool, 70, 10, true), Ok((70, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, 69, 10, true), Ok((0, false)));
        // Negative ticks compress downward: -41 lives in the word of -50
        assert_eq!(next_initialized_tick_within_one_word(&pool, -41, 10, true), Ok((-50, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, -60, 10, true), Ok((-2000, true)));
    }

    #[test]
    fn test_search_right_skips_current_tick() {
        let env = unmetered_env();
        let pool = pool_with_ticks(&env, 500, &[-50, 70, 780]);

        assert_eq!(next_initialized_tick_within_one_word(&pool, 70, 10, false), Ok((780, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, 69, 10, false), Ok((70, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, -55, 10, false), Ok((-50, true)));
        // Nothing right of 780 in word 0
        assert_eq!(next_initialized_tick_within_one_word(&pool, 780, 10, false), Ok((2550, false)));
    }

    #[test]
    fn test_empty_word_returns_both_boundaries() {
        let env = unmetered_env();
        // Markers only in neighbouring words
        let pool = pool_with_ticks(&env, 10000, &[-200, 51200]);

        let (left, initialized) =
            next_initialized_tick_within_one_word(&pool, 20000, 200, true).unwrap();
        assert_eq!((left, initialized), (0, false));

        let (right, initialized) =
            next_initialized_tick_within_one_word(&pool, left, 200, false).unwrap();
        assert_eq!((right, initialized), (255 * 200, false));
    }

    #[test]
    fn test_word_edges() {
        let env = unmetered_env();
        let pool = pool_with_ticks(&env, 500, &[2550, 2560]);

        // Bit 255 of word 0 and bit 0 of word 1
        assert_eq!(next_initialized_tick_within_one_word(&pool, 2559, 10, true), Ok((2550, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, 2550, 10, false), Ok((2560, true)));
        assert_eq!(next_initialized_tick_within_one_word(&pool, 2560, 10, true), Ok((2560, true)));
    }

    #[test]
    fn test_search_rejects_ticks_out_of_range() {
        let env = unmetered_env();
        let pool = pool_with_ticks(&env, 500, &[-2000, 70]);

        assert_eq!(
            next_initialized_tick_within_one_word(&pool, 83886080, 10, true),
            Err(Error::TickOutOfRange)
        );
        assert_eq!(
            next_initialized_tick_within_one_word(&pool, i32::MAX, 1, false),
            Err(Error::TickOutOfRange)
        );
        assert_eq!(
            next_initialized_tick_within_one_word(&pool, MIN_TICK - 1, 10, true),
            Err(Error::TickOutOfRange)
        );
    }

    #[test]
    fn test_search_at_tick_bounds() {
        let env = unmetered_env();
        let pool = pool_with_ticks(&env, 500, &[]);

        // Word boundaries can sit outside the tick bounds
        assert_eq!(
            next_initialized_tick_within_one_word(&pool, MAX_TICK, 1, false),
            Ok((443647, false))
        );
        assert_eq!(
            next_initialized_tick_within_one_word(&pool, MIN_TICK, 1, true),
            Ok((-443648, false))
        );
        // A spacing wide enough to push the boundary past i32 is reported
        assert_eq!(
            next_initialized_tick_within_one_word(&pool, 0, i32::MAX, false),
            Err(Error::Overflow)
        );
    }
}
