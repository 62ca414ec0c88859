#![no_std]

mod broker;
mod error;
mod pool;
mod position;
mod tick;
mod token;

pub use broker::*;
pub use error::*;
pub use pool::*;
pub use position::*;
pub use tick::*;
pub use token::*;

/// Re-exported so downstream crates name the same 256-bit register type.
pub use ethnum::U256;

/// Q96 constant (2^96) for fixed-point math
pub const Q96: u128 = 1 << 96;

/// Resolution of the X128 fee-growth accumulators
pub const Q128_RESOLUTION: u32 = 128;

/// Minimum tick index
/// Bounded so that sqrt prices fit in u128 (160-bit pools reach -887272)
pub const MIN_TICK: i32 = -443636;

/// Maximum tick index
/// Bounded so that sqrt prices fit in u128 (160-bit pools reach 887272)
pub const MAX_TICK: i32 = 443636;

/// Minimum sqrt price, exactly `get_sqrt_ratio_at_tick(MIN_TICK)`
pub const MIN_SQRT_RATIO: u128 = 18447090764788882728;

/// Maximum sqrt price, exactly `get_sqrt_ratio_at_tick(MAX_TICK)`
pub const MAX_SQRT_RATIO: u128 = 340275971719517849884101479065584693834;

/// Fees are expressed in parts per million
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Maximum number of initialized ticks a single swap may cross.
/// Keeps one swap within Soroban's per-transaction write entry budget.
pub const MAX_TICK_CROSSINGS_PER_SWAP: u32 = 40;

/// Fee amount in hundredths of a basis point (1e-6)
/// 500 = 0.05%, 3000 = 0.3%, 10000 = 1%
pub type Fee = u32;

/// Get tick spacing for one of the standard fee tiers
pub fn fee_to_tick_spacing(fee: Fee) -> Option<i32> {
    match fee {
        500 => Some(10),    // 0.05%
        3000 => Some(60),   // 0.3%
        10000 => Some(200), // 1%
        _ => None,
    }
}

/// Calculate maximum liquidity per tick for a given tick spacing
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}
