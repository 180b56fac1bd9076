//! Multi-asset StableSwap pools (Curve style invariant).
//!
//! Balances are normalized to a common 18 decimal scale with per-coin rate multipliers before
//! any solver runs. The amplification coefficient is carried in `A_PRECISION` units and may be
//! ramping linearly between two points in time.

use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, trace};

use super::{
    cache::{memoized, SolverCache, SolverKey},
    errors::QuoteError,
    QuoteContext,
};
use crate::{
    math::{abs_diff, checked_sub, div, ten_pow, Rounding, BPS_DENOMINATOR},
    models::StableSwapState,
};

pub const A_PRECISION: u64 = 100;
/// Bound on the fixed point iterations of both solvers.
pub const MAX_SOLVER_ITERATIONS: usize = 255;
pub const FEE_DENOMINATOR: u32 = BPS_DENOMINATOR;
/// Decimals of the per-coin rate multipliers.
pub const RATE_DECIMALS: u32 = 18;
/// Attempts at nudging an exact output quote up until the forward pass confirms it.
const MAX_INPUT_REFINEMENTS: usize = 8;

/// Amplification at `now` for a linear ramp from `(initial_time, initial_a)` to
/// `(future_time, future_a)`.
///
/// The ramp must end strictly after it starts, even when both endpoints carry the same value.
pub fn amplification(
    initial_time: u64,
    initial_a: u64,
    future_time: u64,
    future_a: u64,
    now: u64,
) -> Result<u64, QuoteError> {
    if future_time <= initial_time {
        return Err(QuoteError::RampOrdering { initial: initial_time, future: future_time });
    }
    if initial_a == future_a || now >= future_time {
        return Ok(future_a);
    }
    if now <= initial_time {
        return Ok(initial_a);
    }

    let elapsed = u128::from(now - initial_time);
    let span = u128::from(future_time - initial_time);
    let (a0, a1) = (u128::from(initial_a), u128::from(future_a));
    let amp = if a1 > a0 {
        a0 + (a1 - a0) * elapsed / span
    } else {
        a0 - (a0 - a1) * elapsed / span
    };
    u64::try_from(amp).map_err(|_| QuoteError::invalid_input("amplification out of range"))
}

/// `Ann = A * n`, in `A_PRECISION` units.
fn ann(amp: u64, token_count: usize) -> BigUint {
    BigUint::from(amp) * token_count
}

/// StableSwap invariant `D` of normalized balances, memoized in `cache`.
pub fn invariant_d(
    xp: &[BigUint],
    amp: u64,
    cache: &dyn SolverCache,
) -> Result<BigUint, QuoteError> {
    let key = SolverKey::Invariant { balances: xp.to_vec(), amplification: amp };
    memoized(cache, key, || compute_d(xp, amp))
}

fn compute_d(xp: &[BigUint], amp: u64) -> Result<BigUint, QuoteError> {
    let n = xp.len();
    let sum: BigUint = xp.iter().sum();
    if sum.is_zero() {
        return Ok(BigUint::zero());
    }
    if xp.iter().any(Zero::is_zero) {
        return Err(QuoteError::unfillable("stable pool holds none of one of its coins"));
    }

    let ann = ann(amp, n);
    let precision = BigUint::from(A_PRECISION);
    let ann_less_precision = checked_sub(&ann, &precision, "Ann - A_PRECISION")?;

    let mut d = sum.clone();
    for iteration in 0..MAX_SOLVER_ITERATIONS {
        let mut d_p = d.clone();
        for x in xp {
            d_p = &d_p * &d / (x * n);
        }
        let previous = d.clone();
        let numerator = (&ann * &sum / &precision + &d_p * n) * &d;
        let denominator = &ann_less_precision * &d / &precision + &d_p * (n + 1);
        d = div(&numerator, &denominator, Rounding::Floor)?;

        if abs_diff(&d, &previous) <= BigUint::from(1u8) {
            trace!(iteration, "InvariantConverged");
            return Ok(d);
        }
    }
    Err(QuoteError::SolverDivergence(format!(
        "D did not converge within {MAX_SOLVER_ITERATIONS} iterations"
    )))
}

/// Returns `(c, partial_sum)` of the balance equation for coin `j`, given that coin `i` holds
/// `x` and every other coin keeps its balance from `xp`.
pub fn balance_coefficients(
    i: usize,
    j: usize,
    x: &BigUint,
    xp: &[BigUint],
    amp: u64,
    d: &BigUint,
) -> Result<(BigUint, BigUint), QuoteError> {
    let n = xp.len();
    if i == j || i >= n || j >= n {
        return Err(QuoteError::invalid_input(format!(
            "coin indices {i} and {j} are invalid for a pool of {n} coins"
        )));
    }
    let ann = ann(amp, n);
    let mut c = d.clone();
    let mut partial_sum = BigUint::zero();
    for (k, balance) in xp.iter().enumerate() {
        if k == j {
            continue;
        }
        let balance = if k == i { x } else { balance };
        if balance.is_zero() {
            return Err(QuoteError::unfillable("stable pool balance would reach zero"));
        }
        partial_sum += balance;
        c = &c * d / (balance * n);
    }
    let c = div(&(c * d * A_PRECISION), &(ann * n), Rounding::Floor)?;
    Ok((c, partial_sum))
}

/// Solves `y^2 + (b - D) y = c` by fixed point iteration, with
/// `b = partial_sum + D * A_PRECISION / Ann`. Memoized in `cache`.
pub fn solve_y(
    c: &BigUint,
    ann: &BigUint,
    partial_sum: &BigUint,
    d: &BigUint,
    token_count: usize,
    cache: &dyn SolverCache,
) -> Result<BigUint, QuoteError> {
    let key = SolverKey::Balance {
        c: c.clone(),
        ann: ann.clone(),
        partial_sum: partial_sum.clone(),
        d: d.clone(),
        token_count,
    };
    memoized(cache, key, || compute_y(c, ann, partial_sum, d))
}

fn compute_y(
    c: &BigUint,
    ann: &BigUint,
    partial_sum: &BigUint,
    d: &BigUint,
) -> Result<BigUint, QuoteError> {
    let b = partial_sum + div(&(d * A_PRECISION), ann, Rounding::Floor)?;
    let mut y = d.clone();
    for iteration in 0..MAX_SOLVER_ITERATIONS {
        let previous = y.clone();
        let denominator = checked_sub(&(&y * 2u32 + &b), d, "2y + b - D")?;
        y = div(&(&y * &y + c), &denominator, Rounding::Floor)?;

        if abs_diff(&y, &previous) <= BigUint::from(1u8) {
            trace!(iteration, "BalanceConverged");
            return Ok(y);
        }
    }
    Err(QuoteError::SolverDivergence(format!(
        "y did not converge within {MAX_SOLVER_ITERATIONS} iterations"
    )))
}

/// Balance of coin `j` once coin `i` holds `x`, keeping `D` constant.
fn balance_after(
    i: usize,
    j: usize,
    x: &BigUint,
    xp: &[BigUint],
    amp: u64,
    d: &BigUint,
    cache: &dyn SolverCache,
) -> Result<BigUint, QuoteError> {
    let (c, partial_sum) = balance_coefficients(i, j, x, xp, amp, d)?;
    solve_y(&c, &ann(amp, xp.len()), &partial_sum, d, xp.len(), cache)
}

fn normalize(amount: &BigUint, rate: &BigUint) -> Result<BigUint, QuoteError> {
    div(&(amount * rate), &ten_pow(RATE_DECIMALS), Rounding::Floor)
}

fn denormalize(
    amount: &BigUint,
    rate: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, QuoteError> {
    div(&(amount * ten_pow(RATE_DECIMALS)), rate, rounding)
}

/// Validated pool data shared by both quote directions.
struct Prepared {
    xp: Vec<BigUint>,
    amp: u64,
    d: BigUint,
}

fn prepare(
    state: &StableSwapState,
    i: usize,
    j: usize,
    ctx: &QuoteContext,
) -> Result<Prepared, QuoteError> {
    state.validate()?;
    let n = state.coins.len();
    if i == j || i >= n || j >= n {
        return Err(QuoteError::invalid_input(format!(
            "coin indices {i} and {j} are invalid for a pool of {n} coins"
        )));
    }
    if state.rates.iter().any(Zero::is_zero) {
        return Err(QuoteError::invalid_input("stable pool with a zero rate"));
    }
    let amp = amplification(
        state.initial_a_time,
        state.initial_a,
        state.future_a_time,
        state.future_a,
        ctx.timestamp,
    )?;
    let xp = state
        .reserves
        .iter()
        .zip(&state.rates)
        .map(|(reserve, rate)| normalize(reserve, rate))
        .collect::<Result<Vec<_>, _>>()?;
    let d = invariant_d(&xp, amp, ctx.caches.invariant.as_ref())?;
    Ok(Prepared { xp, amp, d })
}

/// Amount of coin `j` received for `amount_in` of coin `i`.
///
/// Every fee component is charged on the output. Fees exceeding the output are reported as
/// [`QuoteError::FeeOverflow`] rather than clamped.
pub fn curve_swap_output(
    amount_in: &BigUint,
    state: &StableSwapState,
    i: usize,
    j: usize,
    ctx: &QuoteContext,
) -> Result<BigUint, QuoteError> {
    let Prepared { xp, amp, d } = prepare(state, i, j, ctx)?;
    let x = &xp[i] + normalize(amount_in, &state.rates[i])?;
    let y = balance_after(i, j, &x, &xp, amp, &d, ctx.caches.balance.as_ref())?;
    let dy = checked_sub(&xp[j], &y, "stable output balance")?;

    let fees = div(
        &(&dy * state.fees.total()),
        &BigUint::from(FEE_DENOMINATOR),
        Rounding::Ceil,
    )?;
    if fees > dy {
        return Err(QuoteError::FeeOverflow { amount: dy, fees });
    }
    let out = denormalize(&(&dy - &fees), &state.rates[j], Rounding::Floor)?;
    debug!(amp, %amount_in, %out, "StableSwapQuoted");
    Ok(out)
}

/// Least amount of coin `i` that buys `amount_out` of coin `j`.
pub fn curve_swap_input(
    amount_out: &BigUint,
    state: &StableSwapState,
    i: usize,
    j: usize,
    ctx: &QuoteContext,
) -> Result<BigUint, QuoteError> {
    if amount_out.is_zero() {
        return Ok(BigUint::zero());
    }
    let Prepared { xp, amp, d } = prepare(state, i, j, ctx)?;

    let total_fee = state.fees.total();
    if total_fee >= u64::from(FEE_DENOMINATOR) {
        return Err(QuoteError::unfillable(format!("stable pool fees of {total_fee} bps")));
    }
    let net = div(&(amount_out * &state.rates[j]), &ten_pow(RATE_DECIMALS), Rounding::Ceil)?;
    let dy = div(
        &(net * FEE_DENOMINATOR),
        &BigUint::from(u64::from(FEE_DENOMINATOR) - total_fee),
        Rounding::Ceil,
    )?;
    if dy >= xp[j] {
        return Err(QuoteError::unfillable(format!(
            "requested {amount_out} would drain the stable pool"
        )));
    }

    let y = &xp[j] - &dy;
    let x = balance_after(j, i, &y, &xp, amp, &d, ctx.caches.balance.as_ref())?;
    let dx = checked_sub(&x, &xp[i], "stable input balance")? + 1u32;
    let mut amount_in = denormalize(&dx, &state.rates[i], Rounding::Ceil)?;

    // Both solvers converge to within one unit, so the forward pass has the final word.
    for _ in 0..MAX_INPUT_REFINEMENTS {
        let out = curve_swap_output(&amount_in, state, i, j, ctx)?;
        if &out >= amount_out {
            return Ok(amount_in);
        }
        let shortfall = amount_out - out;
        trace!(%shortfall, "StableInputRefined");
        // Convert the missing output into input units at the pegged rate.
        let bump = div(&(&shortfall * &state.rates[j]), &state.rates[i], Rounding::Ceil)?;
        amount_in += bump + 1u32;
    }
    Err(QuoteError::SolverDivergence(format!(
        "no input within {MAX_INPUT_REFINEMENTS} refinements buys {amount_out}"
    )))
}
