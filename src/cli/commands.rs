//! CLI command implementations

use std::path::Path;

use tracing::info;

use crate::auth::RegisterRequest;
use crate::config::AppConfig;
use crate::http_server::{AppState, HttpServer};
use crate::storage::Storage;
use crate::telemetry::init_tracing;

use super::args::Command;
use super::errors::{CliError, CliErrorCode, CliResult};

/// Dispatch a parsed command
pub async fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config } => serve(config.as_deref()).await,
        Command::Migrate { config } => migrate(config.as_deref()).await,
        Command::AddIdentity {
            username,
            email,
            password,
            config,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
            };
            add_identity(config.as_deref(), request).await
        }
    }
}

fn load(config: Option<&Path>) -> CliResult<AppConfig> {
    let config = AppConfig::load(config)?;
    init_tracing(&config.telemetry);
    Ok(config)
}

async fn state_for(config: &AppConfig) -> CliResult<AppState> {
    let storage = Storage::connect(&config.database).await?;
    let header = config.auth.header_name()?;
    Ok(AppState::new(storage, config.auth.token_config(), header))
}

/// Boot storage and serve until interrupted
pub async fn serve(config: Option<&Path>) -> CliResult<()> {
    let config = load(config)?;
    let state = state_for(&config).await?;

    HttpServer::new(config.server.clone(), state).start().await?;
    info!("server stopped");
    Ok(())
}

/// Run migrations against the configured database
pub async fn migrate(config: Option<&Path>) -> CliResult<()> {
    let config = load(config)?;
    if config.database.url.is_none() {
        return Err(CliError::new(
            CliErrorCode::ConfigError,
            "database.url is required for migrate",
        ));
    }

    // connecting applies pending migrations
    Storage::connect(&config.database).await?;
    info!("migrations applied");
    Ok(())
}

/// Create an identity through the same path as registration
pub async fn add_identity(config: Option<&Path>, request: RegisterRequest) -> CliResult<()> {
    let config = load(config)?;
    if config.database.url.is_none() {
        return Err(CliError::new(
            CliErrorCode::ConfigError,
            "database.url is required for add-identity",
        ));
    }

    let state = state_for(&config).await?;
    let (identity, _) = state.auth.register(request).await?;
    println!("{}", identity.id);
    Ok(())
}
