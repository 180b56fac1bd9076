//! Two-asset pools priced along `U(a, b) = (a + b)^8 - (a - b)^8`.
//!
//! The curve is nearly flat around the balanced point and steepens quickly as the pool
//! unbalances. Reserves are first brought to a common scale by per-asset rate multipliers.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

use super::{errors::QuoteError, inverse::least_input};
use crate::{
    math::{apply_fee, ensure_non_negative, mul_div, ten_pow, Rounding},
    models::{Direction, UtilityCurveState},
};

/// Decimals of the rate multipliers.
pub const RATE_DECIMALS: u32 = 18;
/// Newton-Raphson refinements of the output amount.
pub const NEWTON_ITERATIONS: usize = 5;

/// `(a + b)^8 - (a - b)^8`
pub fn utility(a: &BigInt, b: &BigInt) -> BigInt {
    (a + b).pow(8) - (a - b).pow(8)
}

/// `dU/db = 8 (a + b)^7 + 8 (a - b)^7`
fn utility_slope(a: &BigInt, b: &BigInt) -> BigInt {
    ((a + b).pow(7) + (a - b).pow(7)) * 8
}

/// Solves `U(x + dx, y - dy) = U(x, y)` for `dy` on scaled reserves.
///
/// Starts at `dy = 0` and runs a fixed number of Newton steps. The curve is convex in `dy`, so
/// every iterate stays on the pool-favouring side of the exact root.
pub fn solve_dy(x: &BigUint, y: &BigUint, dx: &BigUint) -> Result<BigUint, QuoteError> {
    let (x, y, dx) = (BigInt::from(x.clone()), BigInt::from(y.clone()), BigInt::from(dx.clone()));
    let target = utility(&x, &y);
    let new_x = &x + &dx;

    let mut dy = BigInt::zero();
    for _ in 0..NEWTON_ITERATIONS {
        let new_y = &y - &dy;
        let slope = utility_slope(&new_x, &new_y);
        if slope.is_zero() {
            return Err(QuoteError::InvariantViolation(
                "utility curve has a flat slope at the candidate point".to_string(),
            ));
        }
        let excess = utility(&new_x, &new_y) - &target;
        dy += excess / slope;
    }
    ensure_non_negative(&dy, "utility curve output")
}

fn scale(amount: &BigUint, rate: &BigUint) -> Result<BigUint, QuoteError> {
    mul_div(amount, rate, &ten_pow(RATE_DECIMALS), Rounding::Floor)
}

pub fn swap_output(
    amount_in: &BigUint,
    state: &UtilityCurveState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (reserve_in, reserve_out, rate_in, rate_out) = state.oriented(direction);
    if rate_in.is_zero() || rate_out.is_zero() {
        return Err(QuoteError::invalid_input("utility curve pool with a zero rate"));
    }
    if amount_in.is_zero() {
        return Ok(BigUint::zero());
    }

    let x = scale(reserve_in, rate_in)?;
    let y = scale(reserve_out, rate_out)?;
    let dx = scale(amount_in, rate_in)?;

    let dy = solve_dy(&x, &y, &dx)?;
    if dy >= y {
        return Err(QuoteError::unfillable(format!(
            "utility curve would pay out {dy} of a scaled reserve of {y}"
        )));
    }

    let unscaled = mul_div(&dy, &ten_pow(RATE_DECIMALS), rate_out, Rounding::Floor)?;
    apply_fee(&unscaled, state.fee_bps, Rounding::Floor)
}

/// Least input buying `amount_out`, found by numeric inversion of [`swap_output`].
pub fn swap_input(
    amount_out: &BigUint,
    state: &UtilityCurveState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (_, reserve_out, _, _) = state.oriented(direction);
    if amount_out >= reserve_out {
        return Err(QuoteError::unfillable(format!(
            "requested {amount_out} but only {reserve_out} is available"
        )));
    }
    least_input(amount_out, |amount_in| swap_output(amount_in, state, direction))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn e18(v: u64) -> BigUint {
        BigUint::from(v) * ten_pow(18)
    }

    fn pool(
        reserve_a: BigUint,
        reserve_b: BigUint,
        rate_b: BigUint,
        fee_bps: u32,
    ) -> UtilityCurveState {
        UtilityCurveState { reserve_a, reserve_b, rate_a: ten_pow(18), rate_b, fee_bps }
    }

    #[rstest]
    #[case::balanced(e18(1_000_000), e18(1_000_000), e18(100))]
    #[case::skewed(e18(1_500_000), e18(300_000), e18(10_000))]
    #[case::tiny(e18(10), e18(10), BigUint::from(1_000u32))]
    fn test_invariant_never_decreases(
        #[case] x: BigUint,
        #[case] y: BigUint,
        #[case] dx: BigUint,
    ) {
        let dy = solve_dy(&x, &y, &dx).unwrap();

        let before = utility(&BigInt::from(x.clone()), &BigInt::from(y.clone()));
        let after = utility(&BigInt::from(&x + &dx), &(BigInt::from(y) - BigInt::from(dy)));
        assert!(after >= before);
    }

    #[test]
    fn test_near_parity_is_almost_one_to_one() {
        let state = pool(e18(1_000_000), e18(1_000_000), ten_pow(18), 0);
        let amount_in = e18(1_000);

        let out = swap_output(&amount_in, &state, Direction::Forward).unwrap();

        assert!(out <= amount_in);
        assert!(out >= &amount_in * 999u32 / 1_000u32);
    }

    #[test]
    fn test_rates_and_fee() {
        // `b` is worth twice as much as `a`, so reserves are balanced in value.
        let state = pool(e18(2_000_000), e18(1_000_000), ten_pow(18) * 2u32, 30);
        let amount_in = e18(1_000);

        let out = swap_output(&amount_in, &state, Direction::Forward).unwrap();

        let fair = e18(500) * 9_970u32 / 10_000u32;
        assert!(out <= fair);
        assert!(out >= &fair * 999u32 / 1_000u32);
    }

    #[test]
    fn test_unbalancing_gets_expensive() {
        let state = pool(e18(1_000_000), e18(1_000_000), ten_pow(18), 0);
        let small = swap_output(&e18(1_000), &state, Direction::Forward).unwrap();
        let large = swap_output(&e18(900_000), &state, Direction::Forward).unwrap();

        // Average price of the large trade is worse than the small one.
        assert!(&large * 1_000u32 < &small * 900_000u32);
    }

    #[test]
    fn test_swap_input_round_trip() {
        let state = pool(e18(1_000_000), e18(800_000), ten_pow(18), 4);
        let target = e18(2_500);

        let needed = swap_input(&target, &state, Direction::Reverse).unwrap();

        assert!(swap_output(&needed, &state, Direction::Reverse).unwrap() >= target);
        assert!(swap_output(&(&needed - 1u32), &state, Direction::Reverse).unwrap() < target);
    }

    #[test]
    fn test_swap_input_beyond_reserve() {
        let state = pool(e18(10), e18(10), ten_pow(18), 0);
        assert!(matches!(
            swap_input(&e18(10), &state, Direction::Forward),
            Err(QuoteError::Unfillable(_))
        ));
    }
}
