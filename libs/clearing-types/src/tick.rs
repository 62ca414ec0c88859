use ethnum::U256;

/// Information stored for each initialized tick
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TickInfo {
    /// Total liquidity referencing this tick
    pub liquidity_gross: u128,
    /// Net liquidity change when tick is crossed (+ when moving right)
    pub liquidity_net: i128,
    /// Fee growth per unit liquidity on the token0 side of this tick (X128)
    pub fee_growth_outside_0_x128: U256,
    /// Fee growth per unit liquidity on the token1 side of this tick (X128)
    pub fee_growth_outside_1_x128: U256,
    /// True if tick has been initialized
    pub initialized: bool,
}

impl TickInfo {
    pub fn new() -> Self {
        Self::default()
    }
}
