use ethnum::U256;
use soroban_sdk::Address;

/// Position key for pool-level tracking.
///
/// Liquidity minted by the broker is keyed by the broker's own identity, so
/// every maker sharing a range shares one key.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: &Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner: owner.clone(),
            tick_lower,
            tick_upper,
        }
    }
}

/// Position info stored in the pool.
///
/// The fee-growth snapshots survive the liquidity reaching zero; they are the
/// baseline for the next accrual.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PositionInfo {
    /// Liquidity in this position
    pub liquidity: u128,
    /// Fee growth inside at last update (token0)
    pub fee_growth_inside_0_last_x128: U256,
    /// Fee growth inside at last update (token1)
    pub fee_growth_inside_1_last_x128: U256,
    /// Uncollected token0
    pub tokens_owed_0: u128,
    /// Uncollected token1
    pub tokens_owed_1: u128,
}

impl PositionInfo {
    pub fn new() -> Self {
        Self::default()
    }
}
