//! Tick-crossing swap simulation.
//!
//! The walk consumes the input one initialised tick range at a time. Within a range liquidity is
//! constant and the closed form Q64.96 formulas apply; at a range boundary the crossed tick's net
//! liquidity is applied and its outside accumulator flipped.

use std::collections::HashSet;

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use tracing::{debug, trace};

use super::tick_math::{approximate_tick, check_price_band, Q96_SHIFT};
use crate::{
    config::TickWalkLimits,
    math::{checked_sub, div, ensure_non_negative, fee_of, gross_up_fee, Rounding},
    models::{ConcentratedState, Direction, TickState},
    simulation::errors::QuoteError,
};

/// Outcome of a simulated swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcentratedSwap {
    pub amount_out: BigUint,
    /// Input left over once liquidity ran out. Zero for a complete fill.
    pub unconsumed_in: BigUint,
    /// Ticks crossed, in crossing order.
    pub crossed_ticks: Vec<i32>,
    /// Pool state after the swap.
    pub final_state: ConcentratedState,
}

impl ConcentratedSwap {
    pub fn is_partial(&self) -> bool {
        !self.unconsumed_in.is_zero()
    }
}

fn q96() -> BigUint {
    BigUint::from(1u8) << Q96_SHIFT
}

fn tick<'a>(state: &'a ConcentratedState, index: i32) -> Result<&'a TickState, QuoteError> {
    let tick = state
        .ticks
        .get(&index)
        .ok_or_else(|| QuoteError::MalformedTicks(format!("tick {index} is not initialised")))?;
    if !(tick.prev < index && index < tick.next) {
        return Err(QuoteError::MalformedTicks(format!(
            "tick {index} links to prev {} and next {}",
            tick.prev, tick.next
        )));
    }
    Ok(tick)
}

/// Applies a signed liquidity delta, failing if liquidity would turn negative.
fn shift_liquidity(liquidity: &BigUint, delta: &BigInt) -> Result<BigUint, QuoteError> {
    ensure_non_negative(&(BigInt::from(liquidity.clone()) + delta), "liquidity after crossing")
}

/// Flips the outside accumulator of a crossed tick.
fn flip_outside(state: &mut ConcentratedState, index: i32) {
    let last_cumulative = state.last_cumulative;
    if let Some(tick) = state.ticks.get_mut(&index) {
        tick.tick_cumulative_outside = last_cumulative - tick.tick_cumulative_outside;
    }
}

/// What one step of the walk did.
enum Step {
    /// Input exhausted inside the current range.
    Filled { amount_out: BigUint },
    /// Moved to the range boundary and crossed the tick at `crossed`.
    Crossed { amount_in: BigUint, amount_out: BigUint, crossed: i32 },
}

/// Swaps `amount_in` through `state`. `Forward` sells token0 and moves the price down, `Reverse`
/// sells token1 and moves it up.
///
/// Stops early with a partial fill when liquidity runs out. The walk is bounded by the number of
/// initialised ticks.
pub fn simulate(
    state: &ConcentratedState,
    amount_in: &BigUint,
    direction: Direction,
    limits: &TickWalkLimits,
) -> Result<ConcentratedSwap, QuoteError> {
    let mut current = state.clone();
    let mut remaining = amount_in.clone();
    let mut amount_out = BigUint::zero();
    let mut crossed_ticks = Vec::new();
    let mut visited = HashSet::new();
    let max_steps = state.ticks.len() + 2;

    for _ in 0..max_steps {
        if remaining.is_zero() || current.liquidity.is_zero() {
            break;
        }
        let fee = fee_of(&remaining, current.fee_bps, Rounding::Ceil)?;
        let usable = checked_sub(&remaining, &fee, "input after fee")?;
        if usable.is_zero() {
            // Dust entirely absorbed by the fee.
            remaining = BigUint::zero();
            break;
        }

        let step = match direction {
            Direction::Forward => step_down(&mut current, &usable, limits)?,
            Direction::Reverse => step_up(&mut current, &usable, limits)?,
        };
        match step {
            Step::Filled { amount_out: out } => {
                amount_out += out;
                remaining = BigUint::zero();
            }
            Step::Crossed { amount_in: net, amount_out: out, crossed } => {
                if !visited.insert(crossed) {
                    return Err(QuoteError::MalformedTicks(format!("tick {crossed} crossed twice")));
                }
                let gross = gross_up_fee(&net, current.fee_bps)?.min(remaining.clone());
                remaining -= gross;
                amount_out += out;
                crossed_ticks.push(crossed);
                trace!(crossed, liquidity = %current.liquidity, "TickCrossed");
            }
        }
    }

    if !remaining.is_zero() && !current.liquidity.is_zero() {
        return Err(QuoteError::MalformedTicks(format!(
            "walk did not finish within {max_steps} steps"
        )));
    }
    debug!(
        %amount_in,
        %amount_out,
        unconsumed = %remaining,
        crossed = crossed_ticks.len(),
        "ConcentratedSwapSimulated"
    );
    Ok(ConcentratedSwap {
        amount_out,
        unconsumed_in: remaining,
        crossed_ticks,
        final_state: current,
    })
}

/// token0 in, price down.
fn step_down(
    state: &mut ConcentratedState,
    usable: &BigUint,
    limits: &TickWalkLimits,
) -> Result<Step, QuoteError> {
    let witness = state.cur_tick_witness;
    let boundary = tick(state, witness)?;
    let price = state.sqrt_price.clone();
    let liquidity_q96 = &state.liquidity << Q96_SHIFT;

    let new_price = div(
        &(&liquidity_q96 * &price),
        &(&liquidity_q96 + usable * &price),
        Rounding::Ceil,
    )?;
    check_price_band(&price, &new_price, limits)?;
    let new_tick = approximate_tick(state.cur_tick_index, &new_price)?;

    if new_tick >= witness && new_price >= boundary.sqrt_price {
        let amount_out = (&state.liquidity * (&price - &new_price)) >> Q96_SHIFT;
        state.sqrt_price = new_price;
        state.cur_tick_index = new_tick;
        return Ok(Step::Filled { amount_out });
    }

    let target = boundary.sqrt_price.clone();
    let price_delta = checked_sub(&price, &target, "sqrt price above the lower boundary")?;
    let amount_in = div(&(&liquidity_q96 * &price_delta), &(&price * &target), Rounding::Ceil)?;
    let amount_out = (&state.liquidity * &price_delta) >> Q96_SHIFT;

    let (prev, liquidity_net) = (boundary.prev, boundary.liquidity_net.clone());
    state.liquidity = shift_liquidity(&state.liquidity, &-liquidity_net)?;
    flip_outside(state, witness);
    state.sqrt_price = target;
    state.cur_tick_index = witness - 1;
    state.cur_tick_witness = prev;
    if !state.ticks.contains_key(&prev) && !state.liquidity.is_zero() {
        return Err(QuoteError::MalformedTicks(format!(
            "liquidity remains below tick {witness} but its prev {prev} is not initialised"
        )));
    }
    Ok(Step::Crossed { amount_in, amount_out, crossed: witness })
}

/// token1 in, price up.
fn step_up(
    state: &mut ConcentratedState,
    usable: &BigUint,
    limits: &TickWalkLimits,
) -> Result<Step, QuoteError> {
    let witness = state.cur_tick_witness;
    let next = tick(state, witness)?.next;
    let upper = tick(state, next)?;
    if upper.prev != witness {
        return Err(QuoteError::MalformedTicks(format!(
            "tick {next} links back to {} instead of {witness}",
            upper.prev
        )));
    }
    let price = state.sqrt_price.clone();
    let liquidity_q96 = &state.liquidity << Q96_SHIFT;

    let new_price = &price + (usable << Q96_SHIFT) / &state.liquidity;
    check_price_band(&price, &new_price, limits)?;
    let new_tick = approximate_tick(state.cur_tick_index, &new_price)?;

    if new_tick < next && new_price < upper.sqrt_price {
        let amount_out = div(
            &(&liquidity_q96 * (&new_price - &price)),
            &(&price * &new_price),
            Rounding::Floor,
        )?;
        state.sqrt_price = new_price;
        state.cur_tick_index = new_tick;
        return Ok(Step::Filled { amount_out });
    }

    let target = upper.sqrt_price.clone();
    let price_delta = checked_sub(&target, &price, "sqrt price below the upper boundary")?;
    let amount_in = div(&(&state.liquidity * &price_delta), &q96(), Rounding::Ceil)?;
    let amount_out =
        div(&(&liquidity_q96 * &price_delta), &(&price * &target), Rounding::Floor)?;

    let liquidity_net = upper.liquidity_net.clone();
    state.liquidity = shift_liquidity(&state.liquidity, &liquidity_net)?;
    flip_outside(state, next);
    state.sqrt_price = target;
    state.cur_tick_index = next;
    state.cur_tick_witness = next;
    Ok(Step::Crossed { amount_in, amount_out, crossed: next })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        math::ten_pow,
        simulation::concentrated::tick_math::{sqrt_price_at_tick, MAX_TICK, MIN_TICK},
    };

    fn tick_state(prev: i32, index: i32, next: i32, liquidity_net: i64) -> TickState {
        TickState {
            prev,
            next,
            sqrt_price: sqrt_price_at_tick(index).unwrap(),
            liquidity_net: BigInt::from(liquidity_net),
            tick_cumulative_outside: 0,
        }
    }

    /// One position over `[-600, 600]` holding `liquidity`, priced at tick 0.
    fn single_range(liquidity: u64) -> ConcentratedState {
        let ticks = BTreeMap::from([
            (-600, tick_state(MIN_TICK, -600, 600, liquidity as i64)),
            (600, tick_state(-600, 600, MAX_TICK, -(liquidity as i64))),
        ]);
        ConcentratedState {
            liquidity: BigUint::from(liquidity),
            sqrt_price: q96(),
            cur_tick_index: 0,
            cur_tick_witness: -600,
            ticks,
            fee_bps: 30,
            last_cumulative: 0,
        }
    }

    /// Two adjacent positions: `[-600, 0]` and `[0, 600]` plus `[-600, 600]` underneath.
    fn stacked() -> ConcentratedState {
        let ticks = BTreeMap::from([
            (-600, tick_state(MIN_TICK, -600, 0, 3_000_000_000_000_000_000)),
            (0, tick_state(-600, 0, 600, -1_000_000_000_000_000_000)),
            (600, tick_state(0, 600, MAX_TICK, -2_000_000_000_000_000_000)),
        ]);
        ConcentratedState {
            liquidity: BigUint::from(2_000_000_000_000_000_000u64),
            sqrt_price: sqrt_price_at_tick(300).unwrap(),
            cur_tick_index: 300,
            cur_tick_witness: 0,
            ticks,
            fee_bps: 5,
            last_cumulative: 1_000,
        }
    }

    fn limits() -> TickWalkLimits {
        TickWalkLimits::default()
    }

    #[test]
    fn test_fill_within_range() {
        let state = single_range(1_000_000_000_000_000_000);
        let amount_in = ten_pow(15);

        let res = simulate(&state, &amount_in, Direction::Forward, &limits()).unwrap();

        assert!(!res.is_partial());
        assert!(res.crossed_ticks.is_empty());
        assert!(res.amount_out < amount_in);
        assert!(res.amount_out > &amount_in * 99u32 / 100u32);
        let end = &res.final_state;
        assert!(end.sqrt_price < state.sqrt_price);
        assert_eq!(end.cur_tick_index, approximate_tick(0, &end.sqrt_price).unwrap());
        assert!(end.cur_tick_index < 0 && end.cur_tick_index >= -600);
        assert_eq!(end.liquidity, state.liquidity);
    }

    #[test]
    fn test_output_bounded_by_range_liquidity() {
        let liquidity = 1_000_000_000_000_000_000u64;
        let state = single_range(liquidity);
        // Roughly three times what it takes to reach tick -600.
        let amount_in = ten_pow(17);

        let res = simulate(&state, &amount_in, Direction::Forward, &limits()).unwrap();

        let boundary = sqrt_price_at_tick(-600).unwrap();
        let expected = (BigUint::from(liquidity) * (q96() - &boundary)) >> 96;
        assert_eq!(res.amount_out, expected);
        assert_eq!(res.crossed_ticks, vec![-600]);
        assert!(res.is_partial());
        assert!(res.final_state.liquidity.is_zero());
        assert_eq!(res.final_state.sqrt_price, boundary);
        assert_eq!(res.final_state.cur_tick_index, -601);
    }

    #[test]
    fn test_zero_liquidity_short_circuits() {
        let mut state = single_range(1_000);
        state.liquidity = BigUint::zero();
        let amount_in = BigUint::from(12_345u32);

        let res = simulate(&state, &amount_in, Direction::Reverse, &limits()).unwrap();

        assert!(res.amount_out.is_zero());
        assert_eq!(res.unconsumed_in, amount_in);
        assert_eq!(res.final_state, state);
    }

    #[test]
    fn test_crossing_up_adds_liquidity_and_flips_outside() {
        let state = stacked();
        let amount_in = BigUint::from(200_000_000_000_000_000u64);

        let res = simulate(&state, &amount_in, Direction::Reverse, &limits()).unwrap();

        assert_eq!(res.crossed_ticks, vec![600]);
        assert!(res.is_partial());
        let end = &res.final_state;
        assert!(end.liquidity.is_zero());
        assert_eq!(end.cur_tick_witness, 600);
        assert_eq!(end.ticks[&600].tick_cumulative_outside, 1_000);
        assert_eq!(end.ticks[&0].tick_cumulative_outside, 0);
        assert_eq!(state.ticks[&600].tick_cumulative_outside, 0);
    }

    #[test]
    fn test_crossing_down_through_two_ticks() {
        let state = stacked();
        let amount_in = BigUint::from(400_000_000_000_000_000u64);

        let res = simulate(&state, &amount_in, Direction::Forward, &limits()).unwrap();

        assert_eq!(res.crossed_ticks, vec![0, -600]);
        let end = &res.final_state;
        assert!(end.liquidity.is_zero());
        assert_eq!(end.ticks[&0].tick_cumulative_outside, 1_000);
        assert_eq!(end.ticks[&-600].tick_cumulative_outside, 1_000);
        assert_eq!(end.sqrt_price, sqrt_price_at_tick(-600).unwrap());
    }

    #[test]
    fn test_reverse_fill_moves_price_up() {
        let state = stacked();
        let amount_in = ten_pow(15);

        let res = simulate(&state, &amount_in, Direction::Reverse, &limits()).unwrap();

        assert!(!res.is_partial());
        assert!(res.final_state.sqrt_price > state.sqrt_price);
        assert!(res.final_state.cur_tick_index >= 300);
        assert!(res.amount_out < amount_in);
    }

    #[test]
    fn test_negative_liquidity_is_rejected() {
        let mut state = single_range(1_000_000_000_000_000_000);
        state
            .ticks
            .get_mut(&-600)
            .unwrap()
            .liquidity_net = BigInt::from(2_000_000_000_000_000_000u64);

        let res = simulate(&state, &ten_pow(17), Direction::Forward, &limits());

        assert!(matches!(res, Err(QuoteError::InvariantViolation(_))));
    }

    #[test]
    fn test_malformed_links_are_rejected() {
        let mut state = single_range(1_000_000_000_000_000_000);
        state.ticks.get_mut(&-600).unwrap().prev = -500;

        let res = simulate(&state, &ten_pow(15), Direction::Forward, &limits());

        assert!(matches!(res, Err(QuoteError::MalformedTicks(_))));
    }

    #[test]
    fn test_missing_upper_tick_is_rejected() {
        let mut state = single_range(1_000_000_000_000_000_000);
        state.ticks.remove(&600);

        let res = simulate(&state, &ten_pow(15), Direction::Reverse, &limits());

        assert!(matches!(res, Err(QuoteError::MalformedTicks(_))));
    }

    #[test]
    fn test_price_band_rejects_large_moves() {
        let state = single_range(1_000_000_000_000_000_000);
        let narrow = TickWalkLimits { min_ratio_bps: 5_000, max_ratio_bps: 20_000 };

        let res = simulate(&state, &(ten_pow(18) * 2u32), Direction::Forward, &narrow);

        assert!(matches!(res, Err(QuoteError::PriceMovedTooFar { .. })));
        assert!(simulate(&state, &(ten_pow(18) * 2u32), Direction::Forward, &limits()).is_ok());
    }
}
