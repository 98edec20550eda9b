//! `psgcp` entry point.
//!
//! The binary owns the single main scheduling context: it starts work on the
//! core's `Scheduler` and ticks it until the operation resumes for the last
//! time.

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);
    commands::run(cli).await
}

/// Logs go to stderr. `RUST_LOG` overrides the level chosen by `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
