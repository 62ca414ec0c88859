use soroban_sdk::contracterror;

/// Failure conditions of the broker and its math.
///
/// Every variant is fail-fast: nothing at this layer retries, and no error is
/// replaced by a default value.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Both desired liquidity amounts are zero, or the swap amount is zero
    ZeroInput = 1,
    /// Liquidity implied by the desired amounts rounds to zero
    ZeroLiquidity = 2,
    /// Exact-output swap without a price limit did not fill exactly
    InsufficientOutput = 3,
    /// Tick outside [MIN_TICK, MAX_TICK]
    TickOutOfRange = 4,
    /// Sqrt price outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)
    SqrtPriceOutOfRange = 5,
    /// Fixed-point result does not fit its output width
    Overflow = 6,
    DivisionByZero = 7,
    LiquidityUnderflow = 8,
    /// lower >= upper, or a boundary is not on the tick spacing
    InvalidTickRange = 9,
    TickNotAligned = 10,
    InvalidPriceLimit = 11,
    /// The pool's exclusive scope is already held
    PoolLocked = 12,
    TokenNotInPool = 13,
    PositionNotFound = 14,
    TickLiquidityOverflow = 15,
    ObservationTooOld = 16,
    InvalidTokenOrder = 17,
    InsufficientReserves = 18,
    /// Fee is not one of the supported tiers
    UnsupportedFee = 19,
}
