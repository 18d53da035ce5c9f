//! CLI module for routervault
//!
//! Provides the command-line interface:
//! - init: write a default configuration file
//! - run: one backup cycle
//! - serve: recurring scheduler loop
//! - device/artifact/history/schedule: registry, locator, history and
//!   schedule operations

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use errors::{CliError, CliResult};

use tracing_subscriber::EnvFilter;

/// Parses arguments, initializes logging, and runs the selected command on
/// a fresh tokio runtime.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(commands::dispatch(cli))
}
