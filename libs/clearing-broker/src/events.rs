use soroban_sdk::{Address, Env, Symbol};

pub(crate) fn liquidity_added(
    env: &Env,
    pool: &Address,
    lower_tick: i32,
    upper_tick: i32,
    base: u128,
    quote: u128,
    liquidity: u128,
) {
    env.events().publish(
        (Symbol::new(env, "liquidity_added"), pool.clone()),
        (lower_tick, upper_tick, base, quote, liquidity),
    );
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn liquidity_removed(
    env: &Env,
    pool: &Address,
    lower_tick: i32,
    upper_tick: i32,
    base: u128,
    quote: u128,
    fee_base: u128,
    fee_quote: u128,
) {
    env.events().publish(
        (Symbol::new(env, "liquidity_removed"), pool.clone()),
        (lower_tick, upper_tick, base, quote, fee_base, fee_quote),
    );
}

pub(crate) fn swapped(
    env: &Env,
    pool: &Address,
    is_base_to_quote: bool,
    is_exact_input: bool,
    base: u128,
    quote: u128,
    fee: u128,
) {
    env.events().publish(
        (Symbol::new(env, "swapped"), pool.clone()),
        (is_base_to_quote, is_exact_input, base, quote, fee),
    );
}
