//! # Storage
//!
//! Error type shared by the repository traits, and wiring that picks a
//! backend (Postgres or in-memory) at startup.

pub mod postgres;

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::identity::{IdentityRepository, InMemoryIdentityRepository};
use crate::config::DatabaseConfig;
use crate::notes::repository::{InMemoryNoteRepository, NoteRepository};

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend failed to execute the operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// An in-memory lock was poisoned by a panicking writer
    #[error("Lock poisoned")]
    Poisoned,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.constraint().unwrap_or("unique").to_string());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Backend(format!("migration failed: {}", err))
    }
}

/// Repository handles used by the service
#[derive(Clone)]
pub struct Storage {
    pub identities: Arc<dyn IdentityRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Storage {
    /// Volatile storage, lost on exit
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(InMemoryIdentityRepository::new()),
            notes: Arc::new(InMemoryNoteRepository::new()),
        }
    }

    /// Connect to the configured database, or fall back to memory when no
    /// URL is configured. Migrations run before the handles are returned.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let Some(url) = &config.url else {
            warn!("no database.url configured, using in-memory storage");
            return Ok(Self::in_memory());
        };

        let pool = postgres::create_pool(url.expose_secret(), config.max_connections).await?;
        postgres::migrate(&pool).await?;
        info!(max_connections = config.max_connections, "connected to postgres");

        Ok(Self {
            identities: Arc::new(postgres::PgIdentityRepository::new(pool.clone())),
            notes: Arc::new(postgres::PgNoteRepository::new(pool)),
        })
    }
}
