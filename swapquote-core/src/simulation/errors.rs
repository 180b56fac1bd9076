use num_bigint::BigUint;
use thiserror::Error;

/// Represents the outer-level, user-facing errors of the quotation engine.
///
/// Variants fall into two classes:
/// - Route-level recoverable failures (`Unfillable`, `PriceMovedTooFar`, `InvariantViolation`,
///   `FeeOverflow`): the route cannot be priced as requested, but nothing is wrong with the engine
///   or the pool data as such. The trade chainer turns them into an empty trade.
/// - Pool-fatal failures (everything else): the snapshot of one pool is corrupt or inconsistent.
///   The caller should discard the route and not retry it with the same inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Unfillable: {0}")]
    Unfillable(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Fee overflow: fees of {fees} exceed the swap amount {amount}")]
    FeeOverflow { amount: BigUint, fees: BigUint },
    #[error("Malformed tick linkage: {0}")]
    MalformedTicks(String),
    #[error("Price moved too far: ratio of {ratio_bps} bps outside [{min_bps}, {max_bps}]")]
    PriceMovedTooFar { ratio_bps: BigUint, min_bps: u64, max_bps: u64 },
    #[error("Amplification ramp ends at {future} which is not after its start {initial}")]
    RampOrdering { initial: u64, future: u64 },
    #[error("Solver did not converge: {0}")]
    SolverDivergence(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl QuoteError {
    /// Whether the failure only disqualifies the current route.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QuoteError::Unfillable(_) |
                QuoteError::PriceMovedTooFar { .. } |
                QuoteError::InvariantViolation(_) |
                QuoteError::FeeOverflow { .. }
        )
    }

    pub fn unfillable(reason: impl ToString) -> Self {
        QuoteError::Unfillable(reason.to_string())
    }

    pub fn invalid_input(reason: impl ToString) -> Self {
        QuoteError::InvalidInput(reason.to_string())
    }
}
