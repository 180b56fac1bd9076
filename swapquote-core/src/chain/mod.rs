//! Prices a route hop by hop into a [`Trade`].
//!
//! Exact input quotes flow forwards: each hop consumes what the previous one produced. Exact output
//! quotes flow backwards from the requested amount. Route-level failures (see
//! [`QuoteError::is_recoverable`]) end the route with an empty trade; anything else is returned as
//! an error so the caller can drop the offending pool.

pub mod slippage;

use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, instrument, warn};

pub use self::slippage::SlippageTolerance;
use crate::{
    models::{Pool, PoolState, QuoteMode, Route, Trade, TradeOperation},
    simulation::{
        concentrated, constant_product, errors::QuoteError, fixed_ratio, identity, stableswap,
        utility_curve, QuoteContext,
    },
};

/// Quotes `amount` through `route` in the requested mode.
///
/// `slippage` only affects exact input quotes.
pub fn quote(
    route: &Route,
    mode: QuoteMode,
    amount: &BigUint,
    slippage: SlippageTolerance,
    ctx: &QuoteContext,
) -> Result<Trade, QuoteError> {
    match mode {
        QuoteMode::ExactInput => quote_exact_input(route, amount, slippage, ctx),
        QuoteMode::ExactOutput => quote_exact_output(route, amount, ctx),
    }
}

/// Sells exactly `amount_in` of the route's input asset.
///
/// On a route of more than one hop the slippage tolerance is spread evenly: every hop prices only
/// `per_hop_ratio` of what it is handed, so the route as a whole keeps a `slippage` margin. The
/// recorded input of a hop is the unscaled amount it was handed.
#[instrument(skip_all, fields(hops = route.len(), %amount_in, %slippage))]
pub fn quote_exact_input(
    route: &Route,
    amount_in: &BigUint,
    slippage: SlippageTolerance,
    ctx: &QuoteContext,
) -> Result<Trade, QuoteError> {
    let ratio = if route.len() > 1 { Some(slippage.per_hop_ratio(route.len())?) } else { None };

    let mut operations = Vec::with_capacity(route.len());
    let mut amount = amount_in.clone();
    for (idx, pool) in route.hops().iter().enumerate() {
        let priced = match &ratio {
            Some(ratio) => slippage::scale(&amount, ratio)?,
            None => amount.clone(),
        };
        let quoted = hop_output(pool, &priced, ctx).and_then(|out| ensure_positive(out, pool));
        let output = match quoted {
            Ok(output) => output,
            Err(err) if err.is_recoverable() => {
                warn!(hop = idx, pool = %pool.id, error = %err, "RouteAborted");
                return Ok(Trade::empty(QuoteMode::ExactInput));
            }
            Err(err) => return Err(err),
        };
        debug!(hop = idx, pool = %pool.id, input = %amount, %output, "HopQuoted");
        operations.push(TradeOperation::new(pool.clone(), amount, output.clone()));
        amount = output;
    }
    Ok(Trade::new(QuoteMode::ExactInput, operations))
}

/// Buys exactly `amount_out` of the route's output asset, solving each hop for its least input
/// from the last hop back to the first.
#[instrument(skip_all, fields(hops = route.len(), %amount_out))]
pub fn quote_exact_output(
    route: &Route,
    amount_out: &BigUint,
    ctx: &QuoteContext,
) -> Result<Trade, QuoteError> {
    let mut operations = Vec::with_capacity(route.len());
    let mut amount = amount_out.clone();
    for (idx, pool) in route.hops().iter().enumerate().rev() {
        let input = match hop_input(pool, &amount, ctx) {
            Ok(input) => input,
            Err(err) if err.is_recoverable() => {
                warn!(hop = idx, pool = %pool.id, error = %err, "RouteAborted");
                return Ok(Trade::empty(QuoteMode::ExactOutput));
            }
            Err(err) => return Err(err),
        };
        debug!(hop = idx, pool = %pool.id, %input, output = %amount, "HopQuoted");
        operations.push(TradeOperation::new(pool.clone(), input.clone(), amount));
        amount = input;
    }
    operations.reverse();
    Ok(Trade::new(QuoteMode::ExactOutput, operations))
}

/// A hop that pays out nothing leaves the rest of the route nothing to trade.
fn ensure_positive(output: BigUint, pool: &Pool) -> Result<BigUint, QuoteError> {
    if output.is_zero() {
        return Err(QuoteError::unfillable(format!("pool {} pays out nothing", pool.id)));
    }
    Ok(output)
}

fn hop_output(pool: &Pool, amount_in: &BigUint, ctx: &QuoteContext) -> Result<BigUint, QuoteError> {
    match &pool.state {
        PoolState::ConstantProduct(state) => {
            constant_product::swap_output(amount_in, state, pool.direction)
        }
        PoolState::FixedRatio(state) => fixed_ratio::swap_output(amount_in, state, pool.direction),
        PoolState::UtilityCurve(state) => {
            utility_curve::swap_output(amount_in, state, pool.direction)
        }
        PoolState::StableInvariant(state) => {
            let (i, j) = state.indices(&pool.token_in.id, &pool.token_out.id)?;
            stableswap::curve_swap_output(amount_in, state, i, j, ctx)
        }
        PoolState::ConcentratedLiquidity(state) => {
            concentrated::swap_output(amount_in, state, pool.direction, &ctx.tick_walk)
        }
        PoolState::Identity => Ok(identity(amount_in)),
    }
}

fn hop_input(pool: &Pool, amount_out: &BigUint, ctx: &QuoteContext) -> Result<BigUint, QuoteError> {
    match &pool.state {
        PoolState::ConstantProduct(state) => {
            constant_product::swap_input(amount_out, state, pool.direction)
        }
        PoolState::FixedRatio(state) => fixed_ratio::swap_input(amount_out, state, pool.direction),
        PoolState::UtilityCurve(state) => {
            utility_curve::swap_input(amount_out, state, pool.direction)
        }
        PoolState::StableInvariant(state) => {
            let (i, j) = state.indices(&pool.token_in.id, &pool.token_out.id)?;
            stableswap::curve_swap_input(amount_out, state, i, j, ctx)
        }
        PoolState::ConcentratedLiquidity(state) => {
            concentrated::swap_input(amount_out, state, pool.direction, &ctx.tick_walk)
        }
        PoolState::Identity => Ok(identity(amount_out)),
    }
}
