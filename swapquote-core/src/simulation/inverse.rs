//! Numeric inversion of `swap_output` for invariants without a closed form inverse.
//!
//! Relies on `swap_output` being non-decreasing in its input up to the point where the pool
//! cannot fill the trade any more, after which it reports `Unfillable` or `PriceMovedTooFar`.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;

use super::errors::QuoteError;

/// Upper bound on bracket doublings, i.e. on the bit length of the searched input.
pub const MAX_DOUBLINGS: usize = 256;

/// Finds the least input whose output reaches `target`.
///
/// Grows an upper bracket by doubling, then bisects it. Inputs the pool cannot fill are treated as
/// overshooting, so a target that is only reachable past the fillable range is `Unfillable`.
pub fn least_input<F>(target: &BigUint, swap_output: F) -> Result<BigUint, QuoteError>
where
    F: Fn(&BigUint) -> Result<BigUint, QuoteError>,
{
    if target.is_zero() {
        return Ok(BigUint::zero());
    }

    let overshoots = |amount: &BigUint| -> Result<bool, QuoteError> {
        match swap_output(amount) {
            Ok(out) => Ok(&out >= target),
            Err(QuoteError::Unfillable(_) | QuoteError::PriceMovedTooFar { .. }) => Ok(true),
            Err(err) => Err(err),
        }
    };

    let mut lo = BigUint::zero();
    let mut hi = BigUint::one();
    let mut doublings = 0;
    while !overshoots(&hi)? {
        if doublings == MAX_DOUBLINGS {
            return Err(QuoteError::unfillable(format!(
                "no input below 2^{MAX_DOUBLINGS} reaches {target}"
            )));
        }
        lo = hi.clone();
        hi <<= 1;
        doublings += 1;
    }

    let mut steps = 0usize;
    while &hi - &lo > BigUint::one() {
        let mid = (&lo + &hi) >> 1;
        if overshoots(&mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
        steps += 1;
    }
    trace!(doublings, steps, "InverseBracketed");

    match swap_output(&hi) {
        Ok(out) if &out >= target => Ok(hi),
        Ok(out) => Err(QuoteError::unfillable(format!("output saturates at {out} below {target}"))),
        Err(err) => Err(err),
    }
}
