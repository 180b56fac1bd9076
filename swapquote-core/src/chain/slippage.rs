use std::fmt;

use num_bigint::BigUint;
use serde::Serialize;

use crate::{
    math::{mul_div, nth_root, parse_decimal, ten_pow, Rounding, BPS_DENOMINATOR},
    simulation::errors::QuoteError,
};

/// Decimals of the per-hop slippage ratio.
pub const RATIO_DECIMALS: u32 = 18;

/// Share of the quoted output a trader is willing to give up, in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SlippageTolerance(u32);

impl SlippageTolerance {
    pub fn from_bps(bps: u32) -> Result<Self, QuoteError> {
        if bps >= BPS_DENOMINATOR {
            return Err(QuoteError::invalid_input(format!(
                "slippage of {bps} bps leaves nothing of the trade"
            )));
        }
        Ok(Self(bps))
    }

    /// Parses a percentage such as `"0.5"` or `"3"`, with at most two fractional digits.
    pub fn from_percent_str(percent: &str) -> Result<Self, QuoteError> {
        let bps = parse_decimal(percent, 2)?;
        let bps = u32::try_from(bps).map_err(|_| {
            QuoteError::invalid_input(format!("slippage of {percent}% is too large"))
        })?;
        Self::from_bps(bps)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Ratio applied to each of `hops` hops so that the whole route gives up this tolerance:
    /// `((10_000 - bps) / 10_000)^(1 / hops)` with [`RATIO_DECIMALS`] decimals, rounded down.
    pub fn per_hop_ratio(&self, hops: usize) -> Result<BigUint, QuoteError> {
        let hops = u32::try_from(hops)
            .ok()
            .filter(|hops| *hops > 0)
            .ok_or_else(|| {
                QuoteError::invalid_input(format!("cannot spread slippage over {hops} hops"))
            })?;
        // (10_000 - bps) / 10^4 scaled by 10^(18 * hops), so the root lands on 18 decimals.
        let radicand =
            BigUint::from(BPS_DENOMINATOR - self.0) * ten_pow(RATIO_DECIMALS * hops - 4);
        nth_root(&radicand, hops)
    }
}

impl fmt::Display for SlippageTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Applies a per-hop ratio from [`SlippageTolerance::per_hop_ratio`] to `amount`, rounding down.
pub fn scale(amount: &BigUint, ratio: &BigUint) -> Result<BigUint, QuoteError> {
    mul_div(amount, ratio, &ten_pow(RATIO_DECIMALS), Rounding::Floor)
}
