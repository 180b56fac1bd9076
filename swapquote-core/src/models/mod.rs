pub mod asset;
pub mod pool;
pub mod trade;

use serde::{Deserialize, Serialize};

pub use asset::Asset;
pub use pool::{
    ConcentratedState, ConstantProductState, FixedRatioState, Pool, PoolState, Route,
    StableFees, StableSwapState, TickState, UtilityCurveState,
};
pub use trade::{Price, Trade, TradeOperation};

/// Orientation of a two-sided pool within a hop.
///
/// `Forward` trades the pool's first asset (`a`, the numerator side, or `token0`) for its second
/// one; `Reverse` trades the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Specifies which side of a trade the requested amount fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteMode {
    /// The input amount is fixed; compute what comes out.
    #[default]
    #[serde(alias = "exact-in")]
    ExactInput,
    /// The output amount is fixed; compute what has to go in.
    #[serde(alias = "exact-out")]
    ExactOutput,
}
