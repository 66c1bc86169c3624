//! Service configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `NOTEKEEPER_*` environment variables (`__` separates sections, e.g.
//! `NOTEKEEPER_AUTH__SECRET`).

use std::path::Path;

use axum::http::HeaderName;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::TokenConfig;

/// Minimum signing secret length in bytes (HS256 key size)
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL; in-memory storage is used when absent
    #[serde(default)]
    pub url: Option<Secret<String>>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Token settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: Secret<String>,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    #[serde(default = "default_token_party")]
    pub issuer: String,

    #[serde(default = "default_token_party")]
    pub audience: String,

    /// Request header carrying the raw token
    #[serde(default = "default_token_header")]
    pub token_header: String,
}

fn default_token_ttl_secs() -> i64 {
    3600
}

fn default_token_party() -> String {
    "notekeeper".to_string()
}

fn default_token_header() -> String {
    "x-auth-token".to_string()
}

impl AuthConfig {
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.secret.clone(),
            ttl: chrono::Duration::seconds(self.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS)),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.token_header.as_str())
            .map_err(|_| ConfigError::Invalid(format!("bad token_header {:?}", self.token_header)))
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from `.env`, an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("NOTEKEEPER_").split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.auth.token_ttl_secs) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }
        self.auth.header_name()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_figment(Figment::from(Toml::string(toml)))
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = from_toml(&format!("[auth]\nsecret = \"{}\"", SECRET)).unwrap();

        assert_eq!(config.server.socket_addr(), "0.0.0.0:8080");
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.header_name().unwrap().as_str(), "x-auth-token");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(matches!(from_toml("[server]\nport = 9000"), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = from_toml("[auth]\nsecret = \"short\"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_token_ttl_bounds() {
        for ttl in ["0", "-5", "31536001", "1000000000000000", "9223372036854775807"] {
            let result = from_toml(&format!(
                "[auth]\nsecret = \"{}\"\ntoken_ttl_secs = {}",
                SECRET, ttl
            ));
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "ttl {}", ttl);
        }

        let config = from_toml(&format!(
            "[auth]\nsecret = \"{}\"\ntoken_ttl_secs = {}",
            SECRET, MAX_TOKEN_TTL_SECS
        ))
        .unwrap();
        assert_eq!(
            config.auth.token_config().ttl,
            chrono::Duration::seconds(MAX_TOKEN_TTL_SECS)
        );
    }

    #[test]
    fn test_bad_header_rejected() {
        let result = from_toml(&format!(
            "[auth]\nsecret = \"{}\"\ntoken_header = \"not a header\"",
            SECRET
        ));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[auth]\nsecret = \"{}\"\ntoken_ttl_secs = 60",
            SECRET
        )
        .unwrap();

        let config = AppConfig::from_figment(Figment::from(Toml::file(file.path()))).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.token_config().ttl, chrono::Duration::seconds(60));
    }
}
