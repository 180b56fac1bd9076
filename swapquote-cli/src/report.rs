use num_bigint::BigUint;
use serde::Serialize;
use swapquote_core::{
    models::Price, serde_primitives::biguint_string, QuoteMode, SlippageTolerance, Trade,
};

/// One priced hop, amounts in atomic units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopReport {
    pub pool: String,
    pub kind: &'static str,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "biguint_string")]
    pub amount_in: BigUint,
    #[serde(with = "biguint_string")]
    pub amount_out: BigUint,
}

/// JSON printed by the `quote` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReport {
    pub mode: QuoteMode,
    pub slippage: String,
    pub timestamp: u64,
    /// Human readable totals in units of the route's input and output assets.
    pub amount_in: String,
    pub amount_out: String,
    pub execution_price: Option<Price>,
    pub hops: Vec<HopReport>,
}

impl TradeReport {
    /// Builds the report of a non-empty trade.
    pub fn new(trade: &Trade, slippage: SlippageTolerance, timestamp: u64) -> Self {
        let hops: Vec<HopReport> = trade
            .operations
            .iter()
            .map(|op| HopReport {
                pool: op.pool.id.clone(),
                kind: op.pool.state.kind(),
                token_in: op.pool.token_in.to_string(),
                token_out: op.pool.token_out.to_string(),
                amount_in: op.input_amount.clone(),
                amount_out: op.output_amount.clone(),
            })
            .collect();
        let (amount_in, amount_out) = match (trade.operations.first(), trade.operations.last()) {
            (Some(first), Some(last)) => (
                first
                    .pool
                    .token_in
                    .to_decimal_string(&trade.amount_in()),
                last.pool
                    .token_out
                    .to_decimal_string(&trade.amount_out()),
            ),
            _ => ("0".to_string(), "0".to_string()),
        };
        Self {
            mode: trade.mode,
            slippage: slippage.to_string(),
            timestamp,
            amount_in,
            amount_out,
            execution_price: trade.execution_price(),
            hops,
        }
    }
}
