//! Fixed-rate pools, e.g. a liquid staking wrapper redeeming at a published exchange rate.
//!
//! The rate is first truncated to 18 decimal fixed point so both directions work off the
//! same number. The fee applies in both directions.

use num_bigint::BigUint;
use num_traits::Zero;

use super::errors::QuoteError;
use crate::{
    math::{div, fee_complement, ten_pow, Rounding, BPS_DENOMINATOR},
    models::{Direction, FixedRatioState},
};

/// Decimals of the fixed point rate.
pub const RATIO_DECIMALS: u32 = 18;

/// `numerator / denominator` as a `10^18` fixed point number, rounded down.
pub fn ratio(state: &FixedRatioState) -> Result<BigUint, QuoteError> {
    if state.denominator.is_zero() {
        return Err(QuoteError::invalid_input("fixed ratio pool with a zero denominator"));
    }
    let scaled = &state.numerator * ten_pow(RATIO_DECIMALS);
    let ratio = div(&scaled, &state.denominator, Rounding::Floor)?;
    if ratio.is_zero() {
        return Err(QuoteError::unfillable("fixed ratio truncates to zero"));
    }
    Ok(ratio)
}

/// Returns `(multiplier, divisor)` turning an input amount into an output amount before fees.
fn scale(state: &FixedRatioState, direction: Direction) -> Result<(BigUint, BigUint), QuoteError> {
    let ratio = ratio(state)?;
    let precision = ten_pow(RATIO_DECIMALS);
    Ok(match direction {
        Direction::Forward => (ratio, precision),
        Direction::Reverse => (precision, ratio),
    })
}

pub fn swap_output(
    amount_in: &BigUint,
    state: &FixedRatioState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (multiplier, divisor) = scale(state, direction)?;
    let numerator = amount_in * fee_complement(state.fee_bps)? * multiplier;
    div(&numerator, &(divisor * BPS_DENOMINATOR), Rounding::Floor)
}

pub fn swap_input(
    amount_out: &BigUint,
    state: &FixedRatioState,
    direction: Direction,
) -> Result<BigUint, QuoteError> {
    let (multiplier, divisor) = scale(state, direction)?;
    let complement = fee_complement(state.fee_bps)?;
    if complement.is_zero() {
        return Err(QuoteError::unfillable("a 100% fee leaves nothing to trade"));
    }
    let numerator = amount_out * BPS_DENOMINATOR * divisor;
    div(&numerator, &(complement * multiplier), Rounding::Ceil)
}
