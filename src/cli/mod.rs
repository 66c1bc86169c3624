//! CLI module for notekeeper
//!
//! Provides command-line interface for:
//! - serve: Boot storage and serve HTTP
//! - migrate: Apply database migrations
//! - add-identity: Provision a login

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{add_identity, migrate, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command).await
}
