use serde::{Deserialize, Serialize};

use crate::{
    math::BPS_DENOMINATOR,
    simulation::{cache::SolverCaches, errors::QuoteError},
};

/// Accepted band for the squared sqrt-price ratio of a single concentrated liquidity step, in
/// basis points of the old price.
///
/// Steps whose new price falls outside the band are rejected before any tick lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickWalkLimits {
    pub min_ratio_bps: u64,
    pub max_ratio_bps: u64,
}

impl Default for TickWalkLimits {
    fn default() -> Self {
        Self { min_ratio_bps: 1, max_ratio_bps: 100_000_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of entries held by each solver cache.
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, capacity: 10_000 }
    }
}

/// Engine wide settings, usually loaded from a YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_walk: TickWalkLimits,
    pub cache: CacheConfig,
    /// Slippage applied to exact input quotes when the request does not carry one.
    pub default_slippage_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_walk: TickWalkLimits::default(),
            cache: CacheConfig::default(),
            default_slippage_bps: 50,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), QuoteError> {
        let TickWalkLimits { min_ratio_bps, max_ratio_bps } = self.tick_walk;
        if min_ratio_bps == 0 || min_ratio_bps > max_ratio_bps {
            return Err(QuoteError::invalid_input(format!(
                "tick walk band [{min_ratio_bps}, {max_ratio_bps}] must be non-empty and positive"
            )));
        }
        if self.default_slippage_bps >= BPS_DENOMINATOR {
            return Err(QuoteError::invalid_input(format!(
                "default slippage of {} bps must stay below {BPS_DENOMINATOR} bps",
                self.default_slippage_bps
            )));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(QuoteError::invalid_input("an enabled cache needs a non-zero capacity"));
        }
        Ok(())
    }

    /// Builds the solver caches described by this configuration.
    pub fn solver_caches(&self) -> SolverCaches {
        if self.cache.enabled {
            SolverCaches::shared(self.cache.capacity)
        } else {
            SolverCaches::noop()
        }
    }
}
