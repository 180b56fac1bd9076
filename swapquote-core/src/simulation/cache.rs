//! Memoization of the StableSwap solvers.
//!
//! Solver results are pure functions of their inputs, so concurrent writers for the same key
//! always write the same value and last-write-wins is fine.

use std::{fmt::Debug, sync::Arc};

use metrics::counter;
use mini_moka::sync::Cache;
use num_bigint::BigUint;
use tracing::trace;

/// Inputs of a memoized solver call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SolverKey {
    /// `D` for the given normalized balances and amplification.
    Invariant { balances: Vec<BigUint>, amplification: u64 },
    /// `y` for the given balance equation coefficients.
    Balance { c: BigUint, ann: BigUint, partial_sum: BigUint, d: BigUint, token_count: usize },
}

/// A concurrent `{get, put}` store for solver results.
pub trait SolverCache: Send + Sync + Debug {
    fn get(&self, key: &SolverKey) -> Option<BigUint>;

    fn put(&self, key: SolverKey, value: BigUint);
}

/// Never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSolverCache;

impl SolverCache for NoopSolverCache {
    fn get(&self, _key: &SolverKey) -> Option<BigUint> {
        None
    }

    fn put(&self, _key: SolverKey, _value: BigUint) {}
}

/// Bounded, thread safe cache backed by `mini_moka`.
pub struct SharedSolverCache {
    name: String,
    cache: Cache<SolverKey, BigUint>,
}

impl SharedSolverCache {
    pub fn new(name: &str, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .build();
        Self { name: name.to_string(), cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Debug for SharedSolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSolverCache")
            .field("name", &self.name)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl SolverCache for SharedSolverCache {
    fn get(&self, key: &SolverKey) -> Option<BigUint> {
        match self.cache.get(key) {
            Some(value) => {
                trace!(cache = %self.name, "CacheHit");
                counter!("solver_cache_hits", "cache" => self.name.clone()).increment(1);
                Some(value)
            }
            None => {
                trace!(cache = %self.name, "CacheMiss");
                counter!("solver_cache_misses", "cache" => self.name.clone()).increment(1);
                None
            }
        }
    }

    fn put(&self, key: SolverKey, value: BigUint) {
        self.cache.insert(key, value);
    }
}

/// The two caches used by the StableSwap kernel.
#[derive(Debug, Clone)]
pub struct SolverCaches {
    pub invariant: Arc<dyn SolverCache>,
    pub balance: Arc<dyn SolverCache>,
}

impl SolverCaches {
    pub fn new(invariant: Arc<dyn SolverCache>, balance: Arc<dyn SolverCache>) -> Self {
        Self { invariant, balance }
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSolverCache), Arc::new(NoopSolverCache))
    }

    pub fn shared(capacity: u64) -> Self {
        Self::new(
            Arc::new(SharedSolverCache::new("invariant", capacity)),
            Arc::new(SharedSolverCache::new("balance", capacity)),
        )
    }
}

impl Default for SolverCaches {
    fn default() -> Self {
        Self::noop()
    }
}

/// Looks `key` up in `cache`, computing and storing the value on a miss.
pub(crate) fn memoized<E>(
    cache: &dyn SolverCache,
    key: SolverKey,
    compute: impl FnOnce() -> Result<BigUint, E>,
) -> Result<BigUint, E> {
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }
    let value = compute()?;
    cache.put(key, value.clone());
    Ok(value)
}
