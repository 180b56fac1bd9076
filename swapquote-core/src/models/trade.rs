use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;

use super::{pool::Pool, QuoteMode};
use crate::{serde_primitives::biguint_string, simulation::errors::QuoteError};

/// Exact price as a fraction of two atomic amounts.
///
/// A `Price` of `numerator / denominator` means `numerator` units of the output asset are
/// received for `denominator` units of the input asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Price {
    #[serde(with = "biguint_string")]
    pub numerator: BigUint,
    #[serde(with = "biguint_string")]
    pub denominator: BigUint,
}

impl Price {
    pub fn new(numerator: BigUint, denominator: BigUint) -> Result<Self, QuoteError> {
        if denominator.is_zero() {
            return Err(QuoteError::invalid_input("price denominator cannot be zero"));
        }
        Ok(Self { numerator, denominator })
    }
}

/// One hop of a priced trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOperation {
    pub pool: Pool,
    #[serde(with = "biguint_string")]
    pub input_amount: BigUint,
    #[serde(with = "biguint_string")]
    pub output_amount: BigUint,
}

impl TradeOperation {
    pub fn new(pool: Pool, input_amount: BigUint, output_amount: BigUint) -> Self {
        Self { pool, input_amount, output_amount }
    }
}

/// A fully priced route. An empty trade means the route could not be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    pub mode: QuoteMode,
    pub operations: Vec<TradeOperation>,
}

impl Trade {
    pub fn new(mode: QuoteMode, operations: Vec<TradeOperation>) -> Self {
        Self { mode, operations }
    }

    pub fn empty(mode: QuoteMode) -> Self {
        Self { mode, operations: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Amount handed to the first hop, zero for an empty trade.
    pub fn amount_in(&self) -> BigUint {
        self.operations
            .first()
            .map(|op| op.input_amount.clone())
            .unwrap_or_default()
    }

    /// Amount produced by the last hop, zero for an empty trade.
    pub fn amount_out(&self) -> BigUint {
        self.operations
            .last()
            .map(|op| op.output_amount.clone())
            .unwrap_or_default()
    }

    /// Output received per unit of input, `None` for empty or zero-input trades.
    pub fn execution_price(&self) -> Option<Price> {
        if self.is_empty() {
            return None;
        }
        Price::new(self.amount_out(), self.amount_in()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, Direction, PoolState};

    fn op(input: u32, output: u32) -> TradeOperation {
        let pool = Pool::new(
            "bridge",
            Asset::new("a", 0),
            Asset::new("a", 0),
            Direction::Forward,
            PoolState::Identity,
        );
        TradeOperation::new(pool, BigUint::from(input), BigUint::from(output))
    }

    #[test]
    fn test_aggregates() {
        let trade = Trade::new(QuoteMode::ExactInput, vec![op(100, 90), op(90, 45)]);

        assert_eq!(trade.amount_in(), BigUint::from(100u32));
        assert_eq!(trade.amount_out(), BigUint::from(45u32));
        assert_eq!(
            trade.execution_price(),
            Some(Price { numerator: BigUint::from(45u32), denominator: BigUint::from(100u32) })
        );
    }

    #[test]
    fn test_empty_trade() {
        let trade = Trade::empty(QuoteMode::ExactOutput);

        assert!(trade.is_empty());
        assert_eq!(trade.amount_out(), BigUint::zero());
        assert_eq!(trade.execution_price(), None);
    }

    #[test]
    fn test_price_rejects_zero_denominator() {
        assert!(Price::new(BigUint::from(1u8), BigUint::zero()).is_err());
        assert!(Trade::new(QuoteMode::ExactInput, vec![op(0, 0)])
            .execution_price()
            .is_none());
    }
}
