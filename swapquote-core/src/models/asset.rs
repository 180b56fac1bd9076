use std::{
    fmt,
    hash::{Hash, Hasher},
};

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
    math::{parse_decimal, ten_pow},
    simulation::errors::QuoteError,
};

/// An opaque asset identifier together with its decimal precision.
///
/// Identity is the `id` alone; two assets with the same id but different metadata compare equal.
#[derive(Debug, Clone, Deserialize, Serialize, Eq)]
pub struct Asset {
    pub id: String,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Asset {
    pub fn new(id: &str, decimals: u32) -> Self {
        Self { id: id.to_string(), decimals, symbol: None }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    /// One whole unit of this asset in atomic units.
    pub fn one(&self) -> BigUint {
        ten_pow(self.decimals)
    }

    /// Scales a human readable decimal amount such as `"12.345"` to atomic units.
    ///
    /// Negative values, exponents and more fractional digits than the asset carries are
    /// rejected instead of being rounded.
    pub fn to_atomic(&self, amount: &str) -> Result<BigUint, QuoteError> {
        parse_decimal(amount, self.decimals)
    }

    /// Renders an atomic amount as a decimal string, dropping trailing fractional zeros.
    pub fn to_decimal_string(&self, atomic: &BigUint) -> String {
        if self.decimals == 0 {
            return atomic.to_string();
        }
        let one = self.one();
        let whole = atomic / &one;
        let fraction = atomic % &one;
        if fraction.is_zero() {
            return whole.to_string();
        }
        let fraction = format!("{:0>width$}", fraction.to_string(), width = self.decimals as usize);
        format!("{whole}.{}", fraction.trim_end_matches('0'))
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{symbol}"),
            None => write!(f, "{}", self.id),
        }
    }
}
