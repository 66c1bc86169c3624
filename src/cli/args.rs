//! CLI argument definitions using clap
//!
//! Commands:
//! - notekeeper serve [--config <path>]
//! - notekeeper migrate [--config <path>]
//! - notekeeper add-identity --username <u> --email <e> --password <p> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// notekeeper - token-authenticated notes service
#[derive(Parser, Debug)]
#[command(name = "notekeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply database migrations and exit
    Migrate {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Provision an identity that can log in
    AddIdentity {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "NOTEKEEPER_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["notekeeper", "serve", "--config", "nk.toml"]).unwrap();
        match cli.command {
            Command::Serve { config } => assert_eq!(config, Some(PathBuf::from("nk.toml"))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_add_identity() {
        let cli = Cli::try_parse_from([
            "notekeeper",
            "add-identity",
            "--username",
            "jo",
            "--email",
            "jo@x.com",
            "--password",
            "password123",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::AddIdentity { ref username, .. } if username == "jo"));
    }
}
