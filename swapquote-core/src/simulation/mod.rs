//! Per-invariant pricing kernels.
//!
//! Every kernel is a set of free functions over an immutable snapshot and atomic `BigUint`
//! amounts. `swap_output` rounds down, `swap_input` rounds up.

pub mod cache;
pub mod concentrated;
pub mod constant_product;
pub mod errors;
pub mod fixed_ratio;
pub mod inverse;
pub mod stableswap;
pub mod utility_curve;

use std::fmt;

use num_bigint::BigUint;

use self::cache::SolverCaches;
use crate::config::{EngineConfig, TickWalkLimits};

/// Everything a quotation needs besides the route and the amount.
#[derive(Clone)]
pub struct QuoteContext {
    /// Unix timestamp, in seconds, at which amplification ramps are evaluated.
    pub timestamp: u64,
    pub caches: SolverCaches,
    pub tick_walk: TickWalkLimits,
}

impl QuoteContext {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp, caches: SolverCaches::noop(), tick_walk: TickWalkLimits::default() }
    }

    pub fn from_config(config: &EngineConfig, timestamp: u64) -> Self {
        Self { timestamp, caches: config.solver_caches(), tick_walk: config.tick_walk }
    }

    pub fn with_caches(mut self, caches: SolverCaches) -> Self {
        self.caches = caches;
        self
    }

    pub fn with_tick_walk(mut self, tick_walk: TickWalkLimits) -> Self {
        self.tick_walk = tick_walk;
        self
    }
}

impl fmt::Debug for QuoteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteContext")
            .field("timestamp", &self.timestamp)
            .field("tick_walk", &self.tick_walk)
            .finish_non_exhaustive()
    }
}

/// The identity bridge hands its input straight through.
pub fn identity(amount: &BigUint) -> BigUint {
    amount.clone()
}
