use crate::lock::PoolGuard;
use crate::{events, fee_growth, Pool, PoolFactory};
use clearing_math::{get_liquidity_for_amounts, get_sqrt_ratio_at_tick, mul_div_rounding_up};
use clearing_types::{
    AddLiquidityParams, AddLiquidityResponse, Error, PositionKey, PositionView,
    RemoveLiquidityParams, RemoveLiquidityResponse, SwapParams, SwapResponse, TokenRoles,
    FEE_DENOMINATOR, MAX_SQRT_RATIO, MIN_SQRT_RATIO, U256,
};
use soroban_sdk::{log, vec, Address, Env};

pub use crate::fee_growth::get_fee_growth_inside;
pub use crate::tick_bitmap::next_initialized_tick_within_one_word;

fn roles<P: Pool + ?Sized>(pool: &P, base_token: &Address) -> Result<TokenRoles, Error> {
    TokenRoles::for_pool(base_token, &pool.token0(), &pool.token1())
}

/// Fee-growth snapshot the pool recorded for `owner`'s range, as (base, quote)
fn position_fee_growth<P: Pool + ?Sized>(
    pool: &P,
    roles: &TokenRoles,
    owner: &Address,
    lower_tick: i32,
    upper_tick: i32,
) -> (U256, U256) {
    let position = pool.positions(&PositionKey::new(owner, lower_tick, upper_tick));
    roles.to_base_quote(
        position.fee_growth_inside_0_last_x128,
        position.fee_growth_inside_1_last_x128,
    )
}

/// Provide liquidity over [lower_tick, upper_tick) from desired base/quote amounts.
///
/// The liquidity minted is the most the desired amounts support at the current
/// price; the response carries what the pool actually took.
pub fn add_liquidity<P: Pool + ?Sized>(
    env: &Env,
    pool: &mut P,
    owner: &Address,
    params: &AddLiquidityParams,
) -> Result<AddLiquidityResponse, Error> {
    if params.base == 0 && params.quote == 0 {
        return Err(Error::ZeroInput);
    }

    let mut pool = PoolGuard::acquire(pool)?;
    let roles = roles(&*pool, &params.base_token)?;
    let (amount0_desired, amount1_desired) = roles.to_token_amounts(params.base, params.quote);

    let liquidity = get_liquidity_for_amounts(
        env,
        pool.slot0().sqrt_price_x96,
        get_sqrt_ratio_at_tick(env, params.lower_tick)?,
        get_sqrt_ratio_at_tick(env, params.upper_tick)?,
        amount0_desired,
        amount1_desired,
    )?;
    if liquidity == 0 {
        log!(
            env,
            "liquidity rounds to zero",
            params.base,
            params.quote,
            params.lower_tick,
            params.upper_tick
        );
        return Err(Error::ZeroLiquidity);
    }

    let (amount0, amount1) = pool.mint(
        owner,
        params.lower_tick,
        params.upper_tick,
        liquidity,
        &params.data,
    )?;
    let (base, quote) = roles.to_base_quote(amount0, amount1);
    let (fee_growth_inside_base_x128, fee_growth_inside_quote_x128) =
        position_fee_growth(&*pool, &roles, owner, params.lower_tick, params.upper_tick);

    events::liquidity_added(
        env,
        &pool.address(),
        params.lower_tick,
        params.upper_tick,
        base,
        quote,
        liquidity,
    );

    Ok(AddLiquidityResponse {
        base,
        quote,
        liquidity,
        fee_growth_inside_base_x128,
        fee_growth_inside_quote_x128,
    })
}

/// Withdraw liquidity from a range and collect everything owed there.
///
/// Collection is range-scoped: fees accrued to `owner`'s whole range come out
/// with the principal, and are reported separately as the surplus over what
/// the burn released.
pub fn remove_liquidity<P: Pool + ?Sized>(
    env: &Env,
    pool: &mut P,
    owner: &Address,
    params: &RemoveLiquidityParams,
) -> Result<RemoveLiquidityResponse, Error> {
    let mut pool = PoolGuard::acquire(pool)?;
    let roles = roles(&*pool, &params.base_token)?;

    let (burned0, burned1) = pool.burn(
        owner,
        params.lower_tick,
        params.upper_tick,
        params.liquidity,
    )?;
    let (collected0, collected1) = pool.collect(
        owner,
        params.lower_tick,
        params.upper_tick,
        u128::MAX,
        u128::MAX,
    )?;
    let fee0 = collected0.checked_sub(burned0).ok_or(Error::Overflow)?;
    let fee1 = collected1.checked_sub(burned1).ok_or(Error::Overflow)?;

    let (base, quote) = roles.to_base_quote(burned0, burned1);
    let (fee_base, fee_quote) = roles.to_base_quote(fee0, fee1);
    let (fee_growth_inside_base_x128, fee_growth_inside_quote_x128) =
        position_fee_growth(&*pool, &roles, owner, params.lower_tick, params.upper_tick);

    events::liquidity_removed(
        env,
        &pool.address(),
        params.lower_tick,
        params.upper_tick,
        base,
        quote,
        fee_base,
        fee_quote,
    );

    Ok(RemoveLiquidityResponse {
        base,
        quote,
        fee_base,
        fee_quote,
        fee_growth_inside_base_x128,
        fee_growth_inside_quote_x128,
    })
}

/// Swap in base/quote terms.
///
/// Without an explicit price limit the swap may run to the global price bound,
/// and an exact-output request must then fill exactly. Exact-input requests
/// accept whatever the pool delivers.
pub fn swap<P: Pool + ?Sized>(
    env: &Env,
    pool: &mut P,
    owner: &Address,
    params: &SwapParams,
) -> Result<SwapResponse, Error> {
    if params.amount == 0 {
        return Err(Error::ZeroInput);
    }

    let mut pool = PoolGuard::acquire(pool)?;
    let roles = roles(&*pool, &params.base_token)?;
    let zero_for_one = roles.zero_for_one(params.is_base_to_quote);

    let amount = i128::try_from(params.amount).map_err(|_| Error::Overflow)?;
    let amount_specified = if params.is_exact_input {
        amount
    } else {
        -amount
    };
    let sqrt_price_limit_x96 = params.sqrt_price_limit_x96.unwrap_or(if zero_for_one {
        MIN_SQRT_RATIO + 1
    } else {
        MAX_SQRT_RATIO - 1
    });

    let (amount0, amount1) = pool.swap(
        owner,
        zero_for_one,
        amount_specified,
        sqrt_price_limit_x96,
        &params.data,
    )?;
    let (amount0, amount1) = (amount0.unsigned_abs(), amount1.unsigned_abs());

    // Input is token0 iff zero_for_one; the specified side is the input side
    // for exact-input swaps and the other one otherwise
    let specified = if params.is_exact_input == zero_for_one {
        amount0
    } else {
        amount1
    };
    if !params.is_exact_input && params.sqrt_price_limit_x96.is_none() && specified != params.amount
    {
        log!(
            env,
            "exact output not filled",
            specified,
            params.amount
        );
        return Err(Error::InsufficientOutput);
    }

    let paid = if zero_for_one { amount0 } else { amount1 };
    let fee = calc_fee(env, paid, pool.fee())?;
    let (base, quote) = roles.to_base_quote(amount0, amount1);

    events::swapped(
        env,
        &pool.address(),
        params.is_base_to_quote,
        params.is_exact_input,
        base,
        quote,
        fee,
    );

    Ok(SwapResponse { base, quote, fee })
}

/// Fee charged on `amount` at `fee_ppm`, rounded up
pub fn calc_fee(env: &Env, amount: u128, fee_ppm: u32) -> Result<u128, Error> {
    mul_div_rounding_up(
        env,
        amount,
        u128::from(fee_ppm),
        u128::from(FEE_DENOMINATOR),
    )
}

pub fn get_pool<F: PoolFactory + ?Sized>(
    factory: &F,
    base_token: &Address,
    quote_token: &Address,
    fee: u32,
) -> Option<Address> {
    factory.get_pool(base_token, quote_token, fee)
}

pub fn get_tick_spacing<P: Pool + ?Sized>(pool: &P) -> i32 {
    pool.tick_spacing()
}

pub fn get_fee_rate<P: Pool + ?Sized>(pool: &P) -> u32 {
    pool.fee()
}

pub fn get_liquidity<P: Pool + ?Sized>(pool: &P) -> u128 {
    pool.liquidity()
}

pub fn get_sqrt_mark_price<P: Pool + ?Sized>(pool: &P) -> u128 {
    pool.slot0().sqrt_price_x96
}

pub fn get_tick<P: Pool + ?Sized>(pool: &P) -> i32 {
    pool.slot0().tick
}

pub fn get_is_tick_initialized<P: Pool + ?Sized>(pool: &P, tick: i32) -> bool {
    pool.ticks(tick).initialized
}

pub fn get_tick_liquidity_net<P: Pool + ?Sized>(pool: &P, tick: i32) -> i128 {
    pool.ticks(tick).liquidity_net
}

pub fn get_tick_bitmap<P: Pool + ?Sized>(pool: &P, word_pos: i16) -> U256 {
    pool.tick_bitmap(word_pos)
}

/// Sqrt price at the mean tick over the last `twap_interval` seconds.
///
/// An interval of zero reads the current price.
pub fn get_sqrt_mark_twap_x96<P: Pool + ?Sized>(
    env: &Env,
    pool: &P,
    twap_interval: u32,
) -> Result<u128, Error> {
    if twap_interval == 0 {
        return Ok(pool.slot0().sqrt_price_x96);
    }

    let tick_cumulatives = pool.observe(&vec![env, twap_interval, 0])?;
    let start = tick_cumulatives.get(0).ok_or(Error::ObservationTooOld)?;
    let end = tick_cumulatives.get(1).ok_or(Error::ObservationTooOld)?;
    let tick = arithmetic_mean_tick(end - start, twap_interval)?;
    get_sqrt_ratio_at_tick(env, tick)
}

/// Mean tick over `interval` seconds, truncated toward zero
fn arithmetic_mean_tick(tick_cumulative_delta: i64, interval: u32) -> Result<i32, Error> {
    let tick = tick_cumulative_delta / i64::from(interval);
    i32::try_from(tick).map_err(|_| Error::TickOutOfRange)
}

/// Quote-side fee growth inside [lower_tick, upper_tick) at `current_tick`
pub fn get_fee_growth_inside_quote<P: Pool + ?Sized>(
    pool: &P,
    base_token: &Address,
    lower_tick: i32,
    upper_tick: i32,
    current_tick: i32,
) -> Result<U256, Error> {
    let roles = roles(pool, base_token)?;
    let (inside0, inside1) =
        fee_growth::get_fee_growth_inside(pool, lower_tick, upper_tick, current_tick);
    let (_, quote) = roles.to_base_quote(inside0, inside1);
    Ok(quote)
}

pub fn get_position<P: Pool + ?Sized>(
    pool: &P,
    base_token: &Address,
    owner: &Address,
    lower_tick: i32,
    upper_tick: i32,
) -> Result<PositionView, Error> {
    let roles = roles(pool, base_token)?;
    let position = pool.positions(&PositionKey::new(owner, lower_tick, upper_tick));
    let (fee_growth_inside_base_last_x128, fee_growth_inside_quote_last_x128) = roles
        .to_base_quote(
            position.fee_growth_inside_0_last_x128,
            position.fee_growth_inside_1_last_x128,
        );
    let (tokens_owed_base, tokens_owed_quote) =
        roles.to_base_quote(position.tokens_owed_0, position.tokens_owed_1);

    Ok(PositionView {
        liquidity: position.liquidity,
        fee_growth_inside_base_last_x128,
        fee_growth_inside_quote_last_x128,
        tokens_owed_base,
        tokens_owed_quote,
    })
}
