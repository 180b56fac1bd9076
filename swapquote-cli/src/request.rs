//! Quote request files.
//!
//! A request carries the route to price and, optionally, defaults for everything the command line
//! can also specify. Command line values take precedence over the file, the file over the engine
//! configuration.

use std::fs;

use num_bigint::BigUint;
use serde::Deserialize;
use swapquote_core::{EngineConfig, QuoteMode, Route, SlippageTolerance};

use crate::errors::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuoteRequestFile {
    pub route: Route,
    #[serde(default)]
    pub mode: Option<QuoteMode>,
    /// Human readable amount, e.g. `"1.5"`, in units of the fixed side of the trade.
    #[serde(default)]
    pub amount: Option<String>,
    /// Slippage tolerance in percent, e.g. `"0.5"`.
    #[serde(default)]
    pub slippage: Option<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

impl QuoteRequestFile {
    pub fn from_path(path: &str) -> Result<Self, CliError> {
        let contents = fs::read_to_string(path).map_err(|err| CliError::io(path, err))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Values given on the command line, each overriding the request file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub mode: Option<QuoteMode>,
    pub amount: Option<String>,
    pub slippage: Option<String>,
    pub timestamp: Option<u64>,
}

/// A fully resolved quotation: everything needed to call the chainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotePlan {
    pub route: Route,
    pub mode: QuoteMode,
    /// Atomic amount of the route's input asset for exact input quotes, of its output asset
    /// otherwise.
    pub amount: BigUint,
    pub slippage: SlippageTolerance,
    pub timestamp: u64,
}

impl QuotePlan {
    /// Merges the request with `overrides` and the engine defaults. `now` is used when neither
    /// carries a timestamp.
    pub fn resolve(
        request: QuoteRequestFile,
        overrides: Overrides,
        config: &EngineConfig,
        now: u64,
    ) -> Result<Self, CliError> {
        let mode = overrides
            .mode
            .or(request.mode)
            .unwrap_or_default();
        let amount = overrides
            .amount
            .or(request.amount)
            .ok_or_else(|| CliError::MissingArgument("amount".to_string()))?;
        let fixed_side = match mode {
            QuoteMode::ExactInput => request.route.token_in(),
            QuoteMode::ExactOutput => request.route.token_out(),
        };
        let amount = fixed_side.to_atomic(&amount)?;
        let slippage = match overrides.slippage.or(request.slippage) {
            Some(percent) => SlippageTolerance::from_percent_str(&percent)?,
            None => SlippageTolerance::from_bps(config.default_slippage_bps)?,
        };
        let timestamp = overrides
            .timestamp
            .or(request.timestamp)
            .unwrap_or(now);

        Ok(Self { route: request.route, mode, amount, slippage, timestamp })
    }
}
