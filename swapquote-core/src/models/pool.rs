//! Pool snapshots and routes.
//!
//! A snapshot is the full, immutable state needed to price one hop. Snapshots are decoded once
//! per quotation and never mutated by the engine; kernels that advance state (the concentrated
//! liquidity walker) return a new copy instead.

use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use super::{asset::Asset, Direction};
use crate::{serde_primitives::*, simulation::errors::QuoteError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProductState {
    #[serde(with = "biguint_string")]
    pub reserve_a: BigUint,
    #[serde(with = "biguint_string")]
    pub reserve_b: BigUint,
    pub fee_bps: u32,
}

impl ConstantProductState {
    /// Returns `(reserve_in, reserve_out)` for a hop in the given direction.
    pub fn oriented(&self, direction: Direction) -> (&BigUint, &BigUint) {
        match direction {
            Direction::Forward => (&self.reserve_a, &self.reserve_b),
            Direction::Reverse => (&self.reserve_b, &self.reserve_a),
        }
    }
}

/// A pool that exchanges at a fixed `numerator / denominator` rate, independent of size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRatioState {
    #[serde(with = "biguint_string")]
    pub numerator: BigUint,
    #[serde(with = "biguint_string")]
    pub denominator: BigUint,
    pub fee_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityCurveState {
    #[serde(with = "biguint_string")]
    pub reserve_a: BigUint,
    #[serde(with = "biguint_string")]
    pub reserve_b: BigUint,
    /// Multiplier bringing `reserve_a` to the common scale, in 1e18 units.
    #[serde(with = "biguint_string")]
    pub rate_a: BigUint,
    #[serde(with = "biguint_string")]
    pub rate_b: BigUint,
    pub fee_bps: u32,
}

impl UtilityCurveState {
    /// Returns `(reserve_in, reserve_out, rate_in, rate_out)`.
    pub fn oriented(&self, direction: Direction) -> (&BigUint, &BigUint, &BigUint, &BigUint) {
        match direction {
            Direction::Forward => (&self.reserve_a, &self.reserve_b, &self.rate_a, &self.rate_b),
            Direction::Reverse => (&self.reserve_b, &self.reserve_a, &self.rate_b, &self.rate_a),
        }
    }
}

/// Fee components of a stable pool, each in basis points of the output amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StableFees {
    pub provider: u32,
    pub staker: u32,
    pub interface: u32,
    pub dev: u32,
    pub swap: u32,
    pub auction: u32,
}

impl StableFees {
    pub fn total(&self) -> u64 {
        [self.provider, self.staker, self.interface, self.dev, self.swap, self.auction]
            .iter()
            .map(|fee| u64::from(*fee))
            .sum()
    }
}

/// Snapshot of a multi-asset StableSwap pool.
///
/// Amplification values are expressed in `A_PRECISION` units, i.e. an `A` of 100 is stored as
/// `10_000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableSwapState {
    pub coins: Vec<String>,
    #[serde(with = "biguint_vec_string")]
    pub reserves: Vec<BigUint>,
    /// Per-coin multipliers to the common 18 decimal scale, in 1e18 units.
    #[serde(with = "biguint_vec_string")]
    pub rates: Vec<BigUint>,
    pub initial_a: u64,
    pub initial_a_time: u64,
    pub future_a: u64,
    pub future_a_time: u64,
    #[serde(default)]
    pub fees: StableFees,
}

impl StableSwapState {
    pub const MIN_COINS: usize = 2;
    pub const MAX_COINS: usize = 4;

    pub fn validate(&self) -> Result<(), QuoteError> {
        let n = self.coins.len();
        if !(Self::MIN_COINS..=Self::MAX_COINS).contains(&n) {
            return Err(QuoteError::invalid_input(format!(
                "stable pools hold {} to {} coins, got {n}",
                Self::MIN_COINS,
                Self::MAX_COINS
            )));
        }
        if self.reserves.len() != n || self.rates.len() != n {
            return Err(QuoteError::invalid_input(format!(
                "stable pool with {n} coins carries {} reserves and {} rates",
                self.reserves.len(),
                self.rates.len()
            )));
        }
        Ok(())
    }

    /// Resolves the coin indices of a hop from its asset ids.
    pub fn indices(&self, token_in: &str, token_out: &str) -> Result<(usize, usize), QuoteError> {
        let position = |id: &str| {
            self.coins
                .iter()
                .position(|coin| coin == id)
                .ok_or_else(|| {
                    QuoteError::invalid_input(format!("{id} is not a coin of this stable pool"))
                })
        };
        let i = position(token_in)?;
        let j = position(token_out)?;
        if i == j {
            return Err(QuoteError::invalid_input(format!("cannot swap {token_in} for itself")));
        }
        Ok((i, j))
    }
}

/// Bookkeeping of one initialised tick of a concentrated liquidity pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickState {
    pub prev: i32,
    pub next: i32,
    /// Q64.96 square root price at this tick.
    #[serde(with = "biguint_string")]
    pub sqrt_price: BigUint,
    /// Liquidity added when the tick is crossed upwards, removed when crossed downwards.
    #[serde(with = "bigint_string")]
    pub liquidity_net: BigInt,
    pub tick_cumulative_outside: i64,
}

/// Snapshot of a concentrated liquidity pool.
///
/// `cur_tick_witness` is the greatest initialised tick at or below the current price; its
/// `next` link is the first initialised tick above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcentratedState {
    #[serde(with = "biguint_string")]
    pub liquidity: BigUint,
    /// Q64.96 square root of the token1/token0 price.
    #[serde(with = "biguint_string")]
    pub sqrt_price: BigUint,
    pub cur_tick_index: i32,
    pub cur_tick_witness: i32,
    #[serde(with = "tick_map")]
    pub ticks: BTreeMap<i32, TickState>,
    pub fee_bps: u32,
    #[serde(default)]
    pub last_cumulative: i64,
}

/// Closed set of supported pricing invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolState {
    ConstantProduct(ConstantProductState),
    FixedRatio(FixedRatioState),
    UtilityCurve(UtilityCurveState),
    StableInvariant(StableSwapState),
    ConcentratedLiquidity(ConcentratedState),
    /// One to one bridge, for example wrapping a native asset.
    Identity,
}

impl PoolState {
    pub fn kind(&self) -> &'static str {
        match self {
            PoolState::ConstantProduct(_) => "constant_product",
            PoolState::FixedRatio(_) => "fixed_ratio",
            PoolState::UtilityCurve(_) => "utility_curve",
            PoolState::StableInvariant(_) => "stable_invariant",
            PoolState::ConcentratedLiquidity(_) => "concentrated_liquidity",
            PoolState::Identity => "identity",
        }
    }
}

/// A priced edge: a pool snapshot oriented from `token_in` to `token_out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub token_in: Asset,
    pub token_out: Asset,
    #[serde(default)]
    pub direction: Direction,
    pub state: PoolState,
}

impl Pool {
    pub fn new(
        id: &str,
        token_in: Asset,
        token_out: Asset,
        direction: Direction,
        state: PoolState,
    ) -> Self {
        Self { id: id.to_string(), token_in, token_out, direction, state }
    }
}

/// An ordered, connected chain of pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Route {
    hops: Vec<Pool>,
}

impl Route {
    /// Builds a route, checking that every hop consumes what the previous one produced.
    pub fn new(hops: Vec<Pool>) -> Result<Self, QuoteError> {
        if hops.is_empty() {
            return Err(QuoteError::invalid_input("a route needs at least one pool"));
        }
        for (idx, pair) in hops.windows(2).enumerate() {
            if pair[0].token_out != pair[1].token_in {
                return Err(QuoteError::invalid_input(format!(
                    "hop {} produces {} but hop {} consumes {}",
                    idx,
                    pair[0].token_out,
                    idx + 1,
                    pair[1].token_in
                )));
            }
        }
        Ok(Self { hops })
    }

    pub fn hops(&self) -> &[Pool] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn token_in(&self) -> &Asset {
        &self.hops[0].token_in
    }

    pub fn token_out(&self) -> &Asset {
        &self.hops[self.hops.len() - 1].token_out
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hops = Vec::<Pool>::deserialize(deserializer)?;
        Route::new(hops).map_err(serde::de::Error::custom)
    }
}
