//! Exact integer arithmetic with explicit rounding.
//!
//! Every pricing kernel in this crate works on `BigUint` atomic amounts. Rounding is never
//! implicit: callers solving for an amount the trader *receives* round down, callers solving for
//! an amount the trader must *pay* round up. Both directions leave the rounding dust inside the
//! pool.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

use crate::simulation::errors::QuoteError;

/// Denominator of every basis point quantity (fees, slippage, price ratios).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Rounding direction for integer divisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Towards zero. Used for amounts paid out by a pool.
    Floor,
    /// Away from zero. Used for amounts owed to a pool.
    Ceil,
}

/// Divides `numerator` by `denominator` with the requested rounding.
pub fn div(
    numerator: &BigUint,
    denominator: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, QuoteError> {
    if denominator.is_zero() {
        return Err(QuoteError::invalid_input("division by zero"));
    }
    let quotient = numerator / denominator;
    match rounding {
        Rounding::Floor => Ok(quotient),
        Rounding::Ceil => {
            if (numerator % denominator).is_zero() {
                Ok(quotient)
            } else {
                Ok(quotient + 1u32)
            }
        }
    }
}

/// Computes `a * b / denominator` without intermediate truncation.
pub fn mul_div(
    a: &BigUint,
    b: &BigUint,
    denominator: &BigUint,
    rounding: Rounding,
) -> Result<BigUint, QuoteError> {
    div(&(a * b), denominator, rounding)
}

/// Subtracts `rhs` from `lhs`, failing instead of wrapping when the result would be negative.
pub fn checked_sub(lhs: &BigUint, rhs: &BigUint, what: &str) -> Result<BigUint, QuoteError> {
    if lhs < rhs {
        return Err(QuoteError::InvariantViolation(format!("{what}: {lhs} - {rhs} is negative")));
    }
    Ok(lhs - rhs)
}

/// Converts a signed intermediate back into an amount, failing on negative values.
pub fn ensure_non_negative(value: &BigInt, what: &str) -> Result<BigUint, QuoteError> {
    value
        .to_biguint()
        .ok_or_else(|| QuoteError::InvariantViolation(format!("{what} is negative: {value}")))
}

pub fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// `base^exp` for integer exponents.
pub fn pow(base: &BigUint, exp: u32) -> BigUint {
    base.pow(exp)
}

/// `10^exp`
pub fn ten_pow(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Integer `n`-th root, rounded down.
pub fn nth_root(value: &BigUint, n: u32) -> Result<BigUint, QuoteError> {
    if n == 0 {
        return Err(QuoteError::invalid_input("zeroth root is undefined"));
    }
    if n == 1 {
        return Ok(value.clone());
    }
    Ok(value.nth_root(n))
}

/// Parses a non-negative decimal such as `"12.345"` into an integer scaled by `10^decimals`.
///
/// Signs, exponents and more fractional digits than `decimals` are rejected instead of rounded.
pub fn parse_decimal(amount: &str, decimals: u32) -> Result<BigUint, QuoteError> {
    let amount = amount.trim();
    let (whole, fraction) = amount
        .split_once('.')
        .unwrap_or((amount, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(QuoteError::invalid_input(format!(
            "{amount:?} is not a non-negative decimal amount"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(QuoteError::invalid_input(format!(
            "{amount:?} has more than {decimals} fractional digits"
        )));
    }

    format!("{whole}{fraction:0<width$}", width = decimals as usize)
        .parse::<BigUint>()
        .map_err(|err| QuoteError::invalid_input(format!("{amount:?}: {err}")))
}

fn check_fee(fee_bps: u32) -> Result<(), QuoteError> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(QuoteError::invalid_input(format!(
            "fee of {fee_bps} bps exceeds {BPS_DENOMINATOR} bps"
        )));
    }
    Ok(())
}

/// The complement of a fee, `10_000 - fee_bps`, as a multiplier over [`BPS_DENOMINATOR`].
pub fn fee_complement(fee_bps: u32) -> Result<BigUint, QuoteError> {
    check_fee(fee_bps)?;
    Ok(BigUint::from(BPS_DENOMINATOR - fee_bps))
}

/// Removes the fee from `amount`: `amount * (10_000 - fee_bps) / 10_000`.
pub fn apply_fee(
    amount: &BigUint,
    fee_bps: u32,
    rounding: Rounding,
) -> Result<BigUint, QuoteError> {
    mul_div(amount, &fee_complement(fee_bps)?, &BigUint::from(BPS_DENOMINATOR), rounding)
}

/// The fee charged on `amount`: `amount * fee_bps / 10_000`.
pub fn fee_of(amount: &BigUint, fee_bps: u32, rounding: Rounding) -> Result<BigUint, QuoteError> {
    check_fee(fee_bps)?;
    mul_div(amount, &BigUint::from(fee_bps), &BigUint::from(BPS_DENOMINATOR), rounding)
}

/// Inverse of [`apply_fee`]: the gross amount whose post-fee value covers `net`.
pub fn gross_up_fee(net: &BigUint, fee_bps: u32) -> Result<BigUint, QuoteError> {
    let complement = fee_complement(fee_bps)?;
    if complement.is_zero() {
        return Err(QuoteError::unfillable("a 100% fee leaves nothing to trade"));
    }
    mul_div(net, &BigUint::from(BPS_DENOMINATOR), &complement, Rounding::Ceil)
}
