use std::process;

use clap::Parser;
use swapquote_cli::cli::{run_quote, show_config, Cli, Command};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Exit code of a route that could not be priced.
const NO_VIABLE_PRICING: i32 = 2;

fn create_tracing_subscriber(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .compact();
    // Logs go to stderr so stdout only ever carries the JSON report.
    tracing_subscriber::fmt()
        .event_format(format)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let global_args = cli.args();
    create_tracing_subscriber(global_args.verbose);

    match cli.command() {
        Command::Quote(quote_args) => {
            let outcome = run_quote(&global_args, &quote_args)?;
            if outcome.trade.is_empty() {
                warn!("NoViablePricing");
                eprintln!("no viable pricing for this route");
                process::exit(NO_VIABLE_PRICING);
            }
            println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        }
        Command::ShowConfig => {
            print!("{}", show_config(&global_args)?);
        }
    };
    Ok(())
}
