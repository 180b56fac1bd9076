//! Concentrated liquidity pools: liquidity lives in tick ranges and a swap walks across them.
pub mod tick_math;
pub mod walker;

use num_bigint::BigUint;

pub use self::walker::{simulate, ConcentratedSwap};
use super::{errors::QuoteError, inverse::least_input};
use crate::{
    config::TickWalkLimits,
    models::{ConcentratedState, Direction},
};

/// Output of a complete fill. A swap that runs out of liquidity is unfillable.
pub fn swap_output(
    amount_in: &BigUint,
    state: &ConcentratedState,
    direction: Direction,
    limits: &TickWalkLimits,
) -> Result<BigUint, QuoteError> {
    let swap = simulate(state, amount_in, direction, limits)?;
    if swap.is_partial() {
        return Err(QuoteError::unfillable(format!(
            "liquidity ran out with {} of {amount_in} left unswapped",
            swap.unconsumed_in
        )));
    }
    Ok(swap.amount_out)
}

/// Least input buying `amount_out`.
pub fn swap_input(
    amount_out: &BigUint,
    state: &ConcentratedState,
    direction: Direction,
    limits: &TickWalkLimits,
) -> Result<BigUint, QuoteError> {
    least_input(amount_out, |amount_in| swap_output(amount_in, state, direction, limits))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use num_bigint::BigInt;

    use super::{tick_math::sqrt_price_at_tick, *};
    use crate::models::TickState;

    fn wide_pool() -> ConcentratedState {
        let liquidity = 1_000_000_000_000_000_000i64;
        let tick = |prev, index, next, net: i64| TickState {
            prev,
            next,
            sqrt_price: sqrt_price_at_tick(index).unwrap(),
            liquidity_net: BigInt::from(net),
            tick_cumulative_outside: 0,
        };
        ConcentratedState {
            liquidity: BigUint::from(liquidity as u64),
            sqrt_price: sqrt_price_at_tick(0).unwrap(),
            cur_tick_index: 0,
            cur_tick_witness: -600,
            ticks: BTreeMap::from([
                (-600, tick(tick_math::MIN_TICK, -600, 600, liquidity)),
                (600, tick(-600, 600, tick_math::MAX_TICK, -liquidity)),
            ]),
            fee_bps: 30,
            last_cumulative: 0,
        }
    }

    #[test]
    fn test_swap_input_buys_target() {
        let state = wide_pool();
        let limits = TickWalkLimits::default();
        let target = BigUint::from(5_000_000_000_000_000u64);

        let needed = swap_input(&target, &state, Direction::Reverse, &limits).unwrap();

        assert!(swap_output(&needed, &state, Direction::Reverse, &limits).unwrap() >= target);
        let short = swap_output(&(&needed - 1u32), &state, Direction::Reverse, &limits);
        assert!(short.map_or(true, |out| out < target));
    }

    #[test]
    fn test_partial_fill_is_unfillable() {
        let state = wide_pool();
        let res = swap_output(
            &BigUint::from(100_000_000_000_000_000u64),
            &state,
            Direction::Forward,
            &TickWalkLimits::default(),
        );
        assert!(matches!(res, Err(QuoteError::Unfillable(_))));
    }

    #[test]
    fn test_swap_input_beyond_liquidity() {
        let state = wide_pool();
        let res = swap_input(
            &BigUint::from(100_000_000_000_000_000u64),
            &state,
            Direction::Forward,
            &TickWalkLimits::default(),
        );
        assert!(matches!(res, Err(QuoteError::Unfillable(_))));
    }
}
