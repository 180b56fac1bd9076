//! `x * y = k` pools.

use num_bigint::BigUint;
use num_traits::Zero;

use super::errors::QuoteError;
use crate::{
    math::{div, fee_complement, Rounding, BPS_DENOMINATOR},
    models::{ConstantProductState, Direction},
};

/// Amount received for `amount_in`, fee taken from the input.
///
/// `out = floor(in * f * r_out / (r_in + in * f))` with `f = (10_000 - fee_bps) / 10_000`, kept
/// in integers by multiplying through by 10_000.
pub fn swap_output(
    amount_in: &BigUint,
    state: &ConstantProductState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (reserve_in, reserve_out) = state.oriented(direction);
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(QuoteError::unfillable("pool has no reserves"));
    }
    let in_with_fee = amount_in * fee_complement(state.fee_bps)?;
    let numerator = &in_with_fee * reserve_out;
    let denominator = reserve_in * BPS_DENOMINATOR + in_with_fee;
    div(&numerator, &denominator, Rounding::Floor)
}

/// Least input that buys at least `amount_out`.
///
/// `in = ceil(r_in * out / ((r_out - out) * f)) + 1`. Asking for the whole output reserve or more
/// is unfillable.
pub fn swap_input(
    amount_out: &BigUint,
    state: &ConstantProductState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (reserve_in, reserve_out) = state.oriented(direction);
    if amount_out >= reserve_out {
        return Err(QuoteError::unfillable(format!(
            "requested {amount_out} but only {reserve_out} is available"
        )));
    }
    let complement = fee_complement(state.fee_bps)?;
    if complement.is_zero() {
        return Err(QuoteError::unfillable("a 100% fee leaves nothing to trade"));
    }
    let numerator = reserve_in * amount_out * BPS_DENOMINATOR;
    let denominator = (reserve_out - amount_out) * complement;
    Ok(div(&numerator, &denominator, Rounding::Ceil)? + 1u32)
}
