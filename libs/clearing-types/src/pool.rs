use soroban_sdk::Address;

/// Price slot of a pool: the values a swap moves
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slot0 {
    /// Current sqrt(price) as Q64.96
    pub sqrt_price_x96: u128,
    /// Current tick index
    pub tick: i32,
}

/// Pool configuration - immutable after creation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Token0 address (lower address)
    pub token0: Address,
    /// Token1 address (higher address)
    pub token1: Address,
    /// Fee tier in hundredths of bps
    pub fee: u32,
    /// Tick spacing for this pool
    pub tick_spacing: i32,
    /// Maximum liquidity per tick
    pub max_liquidity_per_tick: u128,
}

impl PoolConfig {
    pub fn new(token0: Address, token1: Address, fee: u32, tick_spacing: i32) -> Self {
        Self {
            token0,
            token1,
            fee,
            tick_spacing,
            max_liquidity_per_tick: crate::max_liquidity_per_tick(tick_spacing),
        }
    }
}

/// One sample of the cumulative-tick oracle
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Observation {
    /// Ledger timestamp the sample was written at
    pub timestamp: u64,
    /// Sum of tick * seconds elapsed, up to `timestamp`
    pub tick_cumulative: i64,
}

impl Observation {
    /// Cumulative value `target` seconds later, assuming `tick` held throughout
    pub fn extrapolate(&self, target: u64, tick: i32) -> i64 {
        let elapsed = target.saturating_sub(self.timestamp) as i64;
        self.tick_cumulative + tick as i64 * elapsed
    }
}
