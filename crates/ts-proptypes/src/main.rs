//! ts-proptypes: React propTypes from TypeScript component props.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let summary = orchestrator::run(&args)?;
    if summary.failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr; `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
