use ethnum::U256;
use soroban_sdk::{contracttype, Address, Bytes};

/// Request to provide liquidity over a tick range
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddLiquidityParams {
    /// Token playing the base role; the other pool token is quote
    pub base_token: Address,
    pub lower_tick: i32,
    pub upper_tick: i32,
    /// Desired base amount
    pub base: u128,
    /// Desired quote amount
    pub quote: u128,
    /// Opaque payload forwarded to the pool's mint callback
    pub data: Bytes,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddLiquidityResponse {
    /// Base actually consumed by the pool
    pub base: u128,
    /// Quote actually consumed by the pool
    pub quote: u128,
    pub liquidity: u128,
    pub fee_growth_inside_base_x128: U256,
    pub fee_growth_inside_quote_x128: U256,
}

/// Request to withdraw liquidity from a tick range
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoveLiquidityParams {
    pub base_token: Address,
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub liquidity: u128,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RemoveLiquidityResponse {
    /// Principal released by the burn
    pub base: u128,
    pub quote: u128,
    /// Collected on top of the principal
    pub fee_base: u128,
    pub fee_quote: u128,
    pub fee_growth_inside_base_x128: U256,
    pub fee_growth_inside_quote_x128: U256,
}

/// Swap intent expressed in base/quote terms
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapParams {
    pub base_token: Address,
    /// True if the caller sells base for quote
    pub is_base_to_quote: bool,
    /// True if `amount` is the input side, false if it is the output side
    pub is_exact_input: bool,
    pub amount: u128,
    /// `None` swaps up to the global price bound
    pub sqrt_price_limit_x96: Option<u128>,
    pub data: Bytes,
}

/// Magnitudes moved by a swap and the fee charged on the paid side
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapResponse {
    pub base: u128,
    pub quote: u128,
    pub fee: u128,
}

/// Position record as seen through the broker
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PositionView {
    pub liquidity: u128,
    pub fee_growth_inside_base_last_x128: U256,
    pub fee_growth_inside_quote_last_x128: U256,
    pub tokens_owed_base: u128,
    pub tokens_owed_quote: u128,
}
