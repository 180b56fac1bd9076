use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use swapquote_core::{quote, EngineConfig, QuoteContext, QuoteMode, Trade};
use tracing::{info, instrument};

use crate::{
    config::load_config,
    errors::CliError,
    report::TradeReport,
    request::{Overrides, QuotePlan, QuoteRequestFile},
};

/// Swapquote - exact quotes for multi-hop swap routes
///
/// Prices a route of liquidity pool snapshots hop by hop and prints the resulting trade as JSON.
#[derive(Parser, PartialEq, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    global_args: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn args(&self) -> GlobalArgs {
        self.global_args.clone()
    }

    pub fn command(&self) -> Command {
        self.command.clone()
    }
}

#[derive(Subcommand, Clone, PartialEq, Debug)]
pub enum Command {
    /// Quotes a route read from a JSON request file.
    Quote(QuoteArgs),
    /// Prints the effective engine configuration as YAML.
    ShowConfig,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Engine configuration file. Defaults are used if the file does not exist.
    #[clap(long, env = "SWAPQUOTE_CONFIG", default_value = "./swapquote.yaml", global = true)]
    pub config: String,

    /// Enable verbose logging. Ignored if RUST_LOG is set.
    #[clap(long, global = true)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    ExactIn,
    ExactOut,
}

impl From<ModeArg> for QuoteMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::ExactIn => QuoteMode::ExactInput,
            ModeArg::ExactOut => QuoteMode::ExactOutput,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct QuoteArgs {
    /// JSON file holding the route and optional quote defaults
    #[clap(long)]
    pub request: String,

    /// Which side of the trade `--amount` fixes
    #[clap(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Amount in whole units of the fixed side, e.g. 1.5
    #[clap(long)]
    pub amount: Option<String>,

    /// Slippage tolerance in percent, e.g. 0.5. Only applies to exact input quotes.
    #[clap(long)]
    pub slippage: Option<String>,

    /// Unix timestamp at which amplification ramps are evaluated. Defaults to now.
    #[clap(long)]
    pub timestamp: Option<u64>,
}

impl QuoteArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.mode == Some(ModeArg::ExactOut) && self.slippage.is_some() {
            return Err(CliError::InvalidArgument(
                "--slippage has no effect on exact output quotes".to_string(),
            ));
        }
        Ok(())
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            mode: self.mode.map(QuoteMode::from),
            amount: self.amount.clone(),
            slippage: self.slippage.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Result of the `quote` command.
#[derive(Debug)]
pub struct QuoteOutcome {
    pub trade: Trade,
    pub report: TradeReport,
}

#[instrument(skip_all, fields(request = %args.request))]
pub fn run_quote(global: &GlobalArgs, args: &QuoteArgs) -> Result<QuoteOutcome, CliError> {
    args.validate()?;
    let config = load_config(&global.config)?;
    let request = QuoteRequestFile::from_path(&args.request)?;
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    quote_request(request, args.overrides(), &config, now)
}

/// Resolves and prices a request with an already loaded configuration.
pub fn quote_request(
    request: QuoteRequestFile,
    overrides: Overrides,
    config: &EngineConfig,
    now: u64,
) -> Result<QuoteOutcome, CliError> {
    let plan = QuotePlan::resolve(request, overrides, config, now)?;
    info!(
        hops = plan.route.len(),
        mode = ?plan.mode,
        amount = %plan.amount,
        slippage = %plan.slippage,
        timestamp = plan.timestamp,
        "Quoting"
    );
    let ctx = QuoteContext::from_config(config, plan.timestamp);
    let trade = quote(&plan.route, plan.mode, &plan.amount, plan.slippage, &ctx)?;
    let report = TradeReport::new(&trade, plan.slippage, plan.timestamp);
    Ok(QuoteOutcome { trade, report })
}

pub fn show_config(global: &GlobalArgs) -> Result<String, CliError> {
    let config = load_config(&global.config)?;
    Ok(serde_yaml::to_string(&config)?)
}
