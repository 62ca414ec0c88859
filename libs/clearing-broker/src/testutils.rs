//! In-memory collaborators for driving the broker without a deployed pool.
extern crate std;

use crate::fee_growth::{fee_growth_delta, fee_growth_inside, tokens_owed};
use crate::tick_bitmap::{self, next_initialized_tick_within_one_word};
use crate::{Pool, PoolFactory};
use clearing_math::{
    add_delta, compute_swap_step, get_amount0_delta, get_amount1_delta, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio,
};
use clearing_types::{
    fee_to_tick_spacing, Error, Observation, PoolConfig, PositionInfo, PositionKey, Slot0,
    TickInfo, MAX_SQRT_RATIO, MAX_TICK, MAX_TICK_CROSSINGS_PER_SWAP, MIN_SQRT_RATIO, MIN_TICK,
    U256,
};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{contract, contractimpl, Address, Bytes, Env, Vec};
use std::collections::BTreeMap;
use std::vec::Vec as StdVec;

/// Concentrated-liquidity pool held entirely in memory.
///
/// Token movements are tracked as reserves instead of transfers. Every
/// mutating primitive validates before it writes, so a failed call leaves the
/// pool untouched.
pub struct MemoryPool {
    env: Env,
    address: Address,
    config: PoolConfig,
    slot0: Slot0,
    liquidity: u128,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
    ticks: BTreeMap<i32, TickInfo>,
    bitmap: BTreeMap<i16, U256>,
    positions: BTreeMap<PositionKey, PositionInfo>,
    observations: StdVec<Observation>,
    reserve0: u128,
    reserve1: u128,
    locked: bool,
    callback_data: Option<Bytes>,
}

impl MemoryPool {
    pub fn new(env: &Env, config: PoolConfig, sqrt_price_x96: u128) -> Result<Self, Error> {
        if config.token0 == config.token1 {
            return Err(Error::InvalidTokenOrder);
        }
        let tick = get_tick_at_sqrt_ratio(env, sqrt_price_x96)?;

        Ok(Self {
            env: env.clone(),
            address: Address::generate(env),
            config,
            slot0: Slot0 {
                sqrt_price_x96,
                tick,
            },
            liquidity: 0,
            fee_growth_global_0_x128: U256::ZERO,
            fee_growth_global_1_x128: U256::ZERO,
            ticks: BTreeMap::new(),
            bitmap: BTreeMap::new(),
            positions: BTreeMap::new(),
            observations: std::vec![Observation {
                timestamp: env.ledger().timestamp(),
                tick_cumulative: 0,
            }],
            reserve0: 0,
            reserve1: 0,
            locked: false,
            callback_data: None,
        })
    }

    /// Pool over two freshly generated token addresses, ordered token0 < token1
    pub fn with_generated_tokens(env: &Env, fee: u32, sqrt_price_x96: u128) -> Result<Self, Error> {
        let tick_spacing = fee_to_tick_spacing(fee).ok_or(Error::UnsupportedFee)?;
        let (token_a, token_b) = (Address::generate(env), Address::generate(env));
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self::new(
            env,
            PoolConfig::new(token0, token1, fee, tick_spacing),
            sqrt_price_x96,
        )
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Token balances held by the pool, as (token0, token1)
    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve0, self.reserve1)
    }

    /// Payload received by the most recent mint or swap
    pub fn callback_data(&self) -> Option<Bytes> {
        self.callback_data.clone()
    }

    /// Toggle the bitmap bit for `tick`
    pub fn flip_tick(&mut self, tick: i32) -> Result<(), Error> {
        let (word_pos, mask) = tick_bitmap::flip_tick(tick, self.config.tick_spacing)?;
        let word = self.tick_bitmap(word_pos) ^ mask;
        if word == U256::ZERO {
            self.bitmap.remove(&word_pos);
        } else {
            self.bitmap.insert(word_pos, word);
        }
        Ok(())
    }

    fn validate_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), Error> {
        if tick_lower < MIN_TICK || tick_upper > MAX_TICK {
            return Err(Error::TickOutOfRange);
        }
        let spacing = self.config.tick_spacing;
        if tick_lower >= tick_upper || tick_lower % spacing != 0 || tick_upper % spacing != 0 {
            return Err(Error::InvalidTickRange);
        }
        Ok(())
    }

    /// Token amounts `liquidity` represents over the range at the current tick
    fn amounts_for_liquidity(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
        round_up: bool,
    ) -> Result<(u128, u128), Error> {
        let env = &self.env;
        let sqrt_lower = get_sqrt_ratio_at_tick(env, tick_lower)?;
        let sqrt_upper = get_sqrt_ratio_at_tick(env, tick_upper)?;
        let Slot0 {
            sqrt_price_x96,
            tick,
        } = self.slot0;

        if tick < tick_lower {
            Ok((
                get_amount0_delta(env, sqrt_lower, sqrt_upper, liquidity, round_up)?,
                0,
            ))
        } else if tick < tick_upper {
            Ok((
                get_amount0_delta(env, sqrt_price_x96, sqrt_upper, liquidity, round_up)?,
                get_amount1_delta(env, sqrt_lower, sqrt_price_x96, liquidity, round_up)?,
            ))
        } else {
            Ok((
                0,
                get_amount1_delta(env, sqrt_lower, sqrt_upper, liquidity, round_up)?,
            ))
        }
    }

    /// Tick state after applying `liquidity_delta`, and whether it flipped
    fn updated_tick(
        &self,
        tick: i32,
        liquidity_delta: i128,
        upper: bool,
    ) -> Result<(TickInfo, bool), Error> {
        let mut info = self.ticks(tick);
        let gross_before = info.liquidity_gross;
        let gross_after = add_delta(gross_before, liquidity_delta)?;
        if gross_after > self.config.max_liquidity_per_tick {
            return Err(Error::TickLiquidityOverflow);
        }

        if gross_before == 0 {
            // Growth so far is attributed below the tick if the price is at or above it
            if tick <= self.slot0.tick {
                info.fee_growth_outside_0_x128 = self.fee_growth_global_0_x128;
                info.fee_growth_outside_1_x128 = self.fee_growth_global_1_x128;
            }
            info.initialized = true;
        }
        info.liquidity_gross = gross_after;
        info.liquidity_net = if upper {
            info.liquidity_net.checked_sub(liquidity_delta)
        } else {
            info.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(Error::Overflow)?;

        Ok((info, (gross_after == 0) != (gross_before == 0)))
    }

    fn store_tick(&mut self, tick: i32, info: TickInfo, flipped: bool) -> Result<(), Error> {
        if flipped {
            self.flip_tick(tick)?;
        }
        if info.liquidity_gross == 0 {
            self.ticks.remove(&tick);
        } else {
            self.ticks.insert(tick, info);
        }
        Ok(())
    }

    /// Apply a liquidity change to a position, accruing fees since its last
    /// snapshot and crediting `released` amounts as owed
    fn modify_position(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        released: (u128, u128),
    ) -> Result<(), Error> {
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let mut position = self.positions(&key);
        if liquidity_delta == 0 && position.liquidity == 0 {
            return Err(Error::PositionNotFound);
        }
        let position_liquidity = add_delta(position.liquidity, liquidity_delta)?;

        let tick_current = self.slot0.tick;
        let in_range = tick_current >= tick_lower && tick_current < tick_upper;
        let active_liquidity = if in_range {
            add_delta(self.liquidity, liquidity_delta)?
        } else {
            self.liquidity
        };

        let (lower, upper) = if liquidity_delta != 0 {
            (
                self.updated_tick(tick_lower, liquidity_delta, false)?,
                self.updated_tick(tick_upper, liquidity_delta, true)?,
            )
        } else {
            ((self.ticks(tick_lower), false), (self.ticks(tick_upper), false))
        };

        let inside_0 = fee_growth_inside(
            self.fee_growth_global_0_x128,
            lower.0.fee_growth_outside_0_x128,
            upper.0.fee_growth_outside_0_x128,
            tick_lower,
            tick_upper,
            tick_current,
        );
        let inside_1 = fee_growth_inside(
            self.fee_growth_global_1_x128,
            lower.0.fee_growth_outside_1_x128,
            upper.0.fee_growth_outside_1_x128,
            tick_lower,
            tick_upper,
            tick_current,
        );

        let accrued_0 = tokens_owed(
            inside_0.wrapping_sub(position.fee_growth_inside_0_last_x128),
            position.liquidity,
        );
        let accrued_1 = tokens_owed(
            inside_1.wrapping_sub(position.fee_growth_inside_1_last_x128),
            position.liquidity,
        );
        position.tokens_owed_0 = position
            .tokens_owed_0
            .checked_add(accrued_0)
            .and_then(|owed| owed.checked_add(released.0))
            .ok_or(Error::Overflow)?;
        position.tokens_owed_1 = position
            .tokens_owed_1
            .checked_add(accrued_1)
            .and_then(|owed| owed.checked_add(released.1))
            .ok_or(Error::Overflow)?;
        position.liquidity = position_liquidity;
        position.fee_growth_inside_0_last_x128 = inside_0;
        position.fee_growth_inside_1_last_x128 = inside_1;

        if liquidity_delta != 0 {
            self.store_tick(tick_lower, lower.0, lower.1)?;
            self.store_tick(tick_upper, upper.0, upper.1)?;
        }
        self.positions.insert(key, position);
        self.liquidity = active_liquidity;
        Ok(())
    }

    /// Flip a tick's outside accumulators as the price crosses it
    fn cross(&mut self, tick: i32, fee_growth_0_x128: U256, fee_growth_1_x128: U256) -> i128 {
        let mut info = self.ticks(tick);
        info.fee_growth_outside_0_x128 = fee_growth_0_x128.wrapping_sub(info.fee_growth_outside_0_x128);
        info.fee_growth_outside_1_x128 = fee_growth_1_x128.wrapping_sub(info.fee_growth_outside_1_x128);
        self.ticks.insert(tick, info);
        info.liquidity_net
    }

    /// Close the running observation at the current ledger time
    fn write_observation(&mut self) {
        let now = self.env.ledger().timestamp();
        if let Some(last) = self.observations.last().copied() {
            if last.timestamp < now {
                self.observations.push(Observation {
                    timestamp: now,
                    tick_cumulative: last.extrapolate(now, self.slot0.tick),
                });
            }
        }
    }

    fn observe_single(&self, now: u64, seconds_ago: u32) -> Result<i64, Error> {
        let target = now
            .checked_sub(u64::from(seconds_ago))
            .ok_or(Error::ObservationTooOld)?;
        let index = self.observations.partition_point(|o| o.timestamp <= target);
        if index == 0 {
            return Err(Error::ObservationTooOld);
        }

        let before = self.observations[index - 1];
        match self.observations.get(index) {
            None => Ok(before.extrapolate(target, self.slot0.tick)),
            Some(after) => {
                // The tick was constant between two samples
                let span = i128::from(after.timestamp - before.timestamp);
                let elapsed = i128::from(target - before.timestamp);
                let delta = i128::from(after.tick_cumulative - before.tick_cumulative);
                Ok(before.tick_cumulative + (delta * elapsed / span) as i64)
            }
        }
    }
}

/// Reserve after the pool receives (positive) or pays (negative) `delta`
fn settle(reserve: u128, delta: i128) -> Result<u128, Error> {
    if delta >= 0 {
        reserve.checked_add(delta as u128).ok_or(Error::Overflow)
    } else {
        reserve
            .checked_sub(delta.unsigned_abs())
            .ok_or(Error::InsufficientReserves)
    }
}

fn to_signed(amount: u128) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::Overflow)
}

impl Pool for MemoryPool {
    fn address(&self) -> Address {
        self.address.clone()
    }

    fn token0(&self) -> Address {
        self.config.token0.clone()
    }

    fn token1(&self) -> Address {
        self.config.token1.clone()
    }

    fn fee(&self) -> u32 {
        self.config.fee
    }

    fn tick_spacing(&self) -> i32 {
        self.config.tick_spacing
    }

    fn slot0(&self) -> Slot0 {
        self.slot0
    }

    fn liquidity(&self) -> u128 {
        self.liquidity
    }

    fn fee_growth_global_0_x128(&self) -> U256 {
        self.fee_growth_global_0_x128
    }

    fn fee_growth_global_1_x128(&self) -> U256 {
        self.fee_growth_global_1_x128
    }

    fn ticks(&self, tick: i32) -> TickInfo {
        self.ticks.get(&tick).copied().unwrap_or_default()
    }

    fn tick_bitmap(&self, word_pos: i16) -> U256 {
        self.bitmap.get(&word_pos).copied().unwrap_or(U256::ZERO)
    }

    fn positions(&self, key: &PositionKey) -> PositionInfo {
        self.positions.get(key).copied().unwrap_or_default()
    }

    fn observe(&self, seconds_agos: &Vec<u32>) -> Result<Vec<i64>, Error> {
        let now = self.env.ledger().timestamp();
        let mut tick_cumulatives = Vec::new(&self.env);
        for seconds_ago in seconds_agos.iter() {
            tick_cumulatives.push_back(self.observe_single(now, seconds_ago)?);
        }
        Ok(tick_cumulatives)
    }

    fn lock(&mut self) -> Result<(), Error> {
        if self.locked {
            return Err(Error::PoolLocked);
        }
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn mint(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        data: &Bytes,
    ) -> Result<(u128, u128), Error> {
        if amount == 0 {
            return Err(Error::ZeroLiquidity);
        }
        self.validate_ticks(tick_lower, tick_upper)?;
        let liquidity_delta = to_signed(amount)?;

        // The pool always rounds in its own favour when taking tokens
        let (amount0, amount1) = self.amounts_for_liquidity(tick_lower, tick_upper, amount, true)?;
        let reserve0 = settle(self.reserve0, to_signed(amount0)?)?;
        let reserve1 = settle(self.reserve1, to_signed(amount1)?)?;

        self.modify_position(owner, tick_lower, tick_upper, liquidity_delta, (0, 0))?;
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
        self.callback_data = Some(data.clone());

        Ok((amount0, amount1))
    }

    fn burn(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(u128, u128), Error> {
        self.validate_ticks(tick_lower, tick_upper)?;
        let liquidity_delta = to_signed(amount)?;

        let (amount0, amount1) = self.amounts_for_liquidity(tick_lower, tick_upper, amount, false)?;
        self.modify_position(
            owner,
            tick_lower,
            tick_upper,
            -liquidity_delta,
            (amount0, amount1),
        )?;

        Ok((amount0, amount1))
    }

    fn collect(
        &mut self,
        owner: &Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let Some(mut position) = self.positions.get(&key).copied() else {
            return Ok((0, 0));
        };

        let amount0 = amount0_requested.min(position.tokens_owed_0);
        let amount1 = amount1_requested.min(position.tokens_owed_1);
        let reserve0 = self
            .reserve0
            .checked_sub(amount0)
            .ok_or(Error::InsufficientReserves)?;
        let reserve1 = self
            .reserve1
            .checked_sub(amount1)
            .ok_or(Error::InsufficientReserves)?;

        position.tokens_owed_0 -= amount0;
        position.tokens_owed_1 -= amount1;
        self.positions.insert(key, position);
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;

        Ok((amount0, amount1))
    }

    fn swap(
        &mut self,
        _owner: &Address,
        zero_for_one: bool,
        amount_specified: i128,
        sqrt_price_limit_x96: u128,
        data: &Bytes,
    ) -> Result<(i128, i128), Error> {
        if amount_specified == 0 {
            return Err(Error::ZeroInput);
        }

        let env = self.env.clone();
        let price = self.slot0.sqrt_price_x96;
        let limit_valid = if zero_for_one {
            sqrt_price_limit_x96 < price && sqrt_price_limit_x96 > MIN_SQRT_RATIO
        } else {
            sqrt_price_limit_x96 > price && sqrt_price_limit_x96 < MAX_SQRT_RATIO
        };
        if !limit_valid {
            return Err(Error::InvalidPriceLimit);
        }

        let exact_input = amount_specified > 0;
        let tick_spacing = self.config.tick_spacing;

        let mut amount_remaining = amount_specified;
        let mut amount_calculated: i128 = 0;
        let mut sqrt_price_x96 = price;
        let mut tick = self.slot0.tick;
        let mut liquidity = self.liquidity;
        let mut fee_growth_global_x128 = if zero_for_one {
            self.fee_growth_global_0_x128
        } else {
            self.fee_growth_global_1_x128
        };
        let mut tick_crossings: u32 = 0;

        while amount_remaining != 0
            && sqrt_price_x96 != sqrt_price_limit_x96
            && tick_crossings < MAX_TICK_CROSSINGS_PER_SWAP
        {
            let step_start_x96 = sqrt_price_x96;
            let (tick_next, initialized) =
                next_initialized_tick_within_one_word(&*self, tick, tick_spacing, zero_for_one)?;
            let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
            let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(&env, tick_next)?;

            let sqrt_ratio_target_x96 = if zero_for_one {
                sqrt_price_next_x96.max(sqrt_price_limit_x96)
            } else {
                sqrt_price_next_x96.min(sqrt_price_limit_x96)
            };

            let step = compute_swap_step(
                &env,
                sqrt_price_x96,
                sqrt_ratio_target_x96,
                liquidity,
                amount_remaining,
                self.config.fee,
            )?;

            let paid = step
                .amount_in
                .checked_add(step.fee_amount)
                .ok_or(Error::Overflow)
                .and_then(to_signed)?;
            let received = to_signed(step.amount_out)?;
            if exact_input {
                amount_remaining -= paid;
                amount_calculated = amount_calculated
                    .checked_sub(received)
                    .ok_or(Error::Overflow)?;
            } else {
                amount_remaining += received;
                amount_calculated = amount_calculated.checked_add(paid).ok_or(Error::Overflow)?;
            }

            fee_growth_global_x128 = fee_growth_global_x128
                .wrapping_add(fee_growth_delta(step.fee_amount, liquidity));
            sqrt_price_x96 = step.sqrt_ratio_next_x96;

            if sqrt_price_x96 == sqrt_price_next_x96 {
                if initialized {
                    let (growth_0, growth_1) = if zero_for_one {
                        (fee_growth_global_x128, self.fee_growth_global_1_x128)
                    } else {
                        (self.fee_growth_global_0_x128, fee_growth_global_x128)
                    };
                    let liquidity_net = self.cross(tick_next, growth_0, growth_1);
                    let liquidity_net = if zero_for_one {
                        -liquidity_net
                    } else {
                        liquidity_net
                    };
                    liquidity = add_delta(liquidity, liquidity_net)?;
                    tick_crossings += 1;
                }
                tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else if sqrt_price_x96 != step_start_x96 {
                tick = get_tick_at_sqrt_ratio(&env, sqrt_price_x96)?;
            }
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (amount_specified - amount_remaining, amount_calculated)
        } else {
            (amount_calculated, amount_specified - amount_remaining)
        };
        let reserve0 = settle(self.reserve0, amount0)?;
        let reserve1 = settle(self.reserve1, amount1)?;

        self.write_observation();
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
        };
        self.liquidity = liquidity;
        if zero_for_one {
            self.fee_growth_global_0_x128 = fee_growth_global_x128;
        } else {
            self.fee_growth_global_1_x128 = fee_growth_global_x128;
        }
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
        self.callback_data = Some(data.clone());

        Ok((amount0, amount1))
    }
}

/// Pool registry keyed by the sorted token pair and fee
#[derive(Default)]
pub struct MemoryFactory {
    pools: BTreeMap<(Address, Address, u32), Address>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pool(
        &mut self,
        env: &Env,
        token_a: &Address,
        token_b: &Address,
        fee: u32,
        sqrt_price_x96: u128,
    ) -> Result<MemoryPool, Error> {
        if token_a == token_b {
            return Err(Error::InvalidTokenOrder);
        }
        let tick_spacing = fee_to_tick_spacing(fee).ok_or(Error::UnsupportedFee)?;
        let (token0, token1) = sort_tokens(token_a, token_b);

        let pool = MemoryPool::new(
            env,
            PoolConfig::new(token0.clone(), token1.clone(), fee, tick_spacing),
            sqrt_price_x96,
        )?;
        self.pools.insert((token0, token1, fee), pool.address());
        Ok(pool)
    }
}

impl PoolFactory for MemoryFactory {
    fn get_pool(&self, token_a: &Address, token_b: &Address, fee: u32) -> Option<Address> {
        let (token0, token1) = sort_tokens(token_a, token_b);
        self.pools.get(&(token0, token1, fee)).cloned()
    }
}

fn sort_tokens(token_a: &Address, token_b: &Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a.clone(), token_b.clone())
    } else {
        (token_b.clone(), token_a.clone())
    }
}

/// Contract frame for running broker operations under test; its address is
/// the position owner
#[contract]
pub struct Harness;

#[contractimpl]
impl Harness {
    pub fn owner(env: Env) -> Address {
        env.current_contract_address()
    }
}

/// Test environment without the host's CPU and memory limits; swaps that walk
/// many bitmap words exceed the default metering
pub fn unmetered_env() -> Env {
    let env = Env::default();
    env.cost_estimate().budget().reset_unlimited();
    env
}

/// Run `f` inside a freshly registered [`Harness`], passing its address
pub fn with_contract<F, R>(env: &Env, f: F) -> R
where
    F: FnOnce(&Address) -> R,
{
    let contract_id = env.register(Harness, ());
    env.as_contract(&contract_id, || f(&contract_id))
}
