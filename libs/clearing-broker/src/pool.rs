use clearing_types::{Error, PositionInfo, PositionKey, Slot0, TickInfo, U256};
use soroban_sdk::{Address, Bytes, Vec};

/// Concentrated-liquidity pool the broker operates on.
///
/// Reads are plain accessors over pool state. The mutating primitives follow
/// the pool's own sign conventions: `mint` returns amounts consumed, `burn`
/// returns amounts made owed (nothing is transferred), `collect` pays out owed
/// amounts, and `swap` returns signed deltas where positive means the caller
/// pays that token and negative means the caller receives it.
pub trait Pool {
    fn address(&self) -> Address;
    fn token0(&self) -> Address;
    fn token1(&self) -> Address;
    /// Fee rate in parts per million
    fn fee(&self) -> u32;
    fn tick_spacing(&self) -> i32;
    fn slot0(&self) -> Slot0;
    /// Liquidity active at the current tick
    fn liquidity(&self) -> u128;
    fn fee_growth_global_0_x128(&self) -> U256;
    fn fee_growth_global_1_x128(&self) -> U256;
    /// Tick state; uninitialized ticks read as default
    fn ticks(&self, tick: i32) -> TickInfo;
    /// Bitmap word at `word_pos`; absent words read as zero
    fn tick_bitmap(&self, word_pos: i16) -> U256;
    fn positions(&self, key: &PositionKey) -> PositionInfo;
    /// Cumulative tick values `seconds_agos[i]` seconds before now
    fn observe(&self, seconds_agos: &Vec<u32>) -> Result<Vec<i64>, Error>;

    /// Enter the pool's exclusive scope; fails if it is already held
    fn lock(&mut self) -> Result<(), Error>;
    fn unlock(&mut self);

    fn mint(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: &Bytes,
    ) -> Result<(u128, u128), Error>;

    fn burn(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(u128, u128), Error>;

    fn collect(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error>;

    fn swap(
        &mut self,
        owner: &Address,
        zero_for_one: bool,
        amount_specified: i128,
        sqrt_price_limit_x96: u128,
        data: &Bytes,
    ) -> Result<(i128, i128), Error>;
}

/// Registry resolving a token pair and fee tier to a pool address
pub trait PoolFactory {
    /// Order of `token_a` and `token_b` does not matter
    fn get_pool(&self, token_a: &Address, token_b: &Address, fee: u32) -> Option<Address>;
}
