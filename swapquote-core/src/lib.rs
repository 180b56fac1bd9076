//! Exact swap quotation over routes of heterogeneous liquidity pools.
//!
//! A [`Route`] is a chain of pool snapshots. [`chain::quote`] prices it with the kernel of each
//! pool's invariant and returns a [`Trade`] that records what every hop consumes and produces.
//! Amounts are atomic integers throughout.

pub mod chain;
pub mod config;
pub mod math;
pub mod models;
pub mod serde_primitives;
pub mod simulation;

pub use chain::{quote, quote_exact_input, quote_exact_output, SlippageTolerance};
pub use config::EngineConfig;
pub use models::{Asset, Direction, Pool, PoolState, QuoteMode, Route, Trade, TradeOperation};
pub use simulation::{errors::QuoteError, QuoteContext};
