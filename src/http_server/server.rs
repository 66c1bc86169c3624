//! # HTTP Server
//!
//! Shared state, router assembly and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::HeaderName, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth_routes::auth_routes;
use super::gate::require_subject;
use super::note_routes::note_routes;
use super::search_routes::search_routes;
use crate::auth::crypto::PasswordPolicy;
use crate::auth::{AuthService, IdentityRepository, TokenConfig, TokenService};
use crate::config::ServerConfig;
use crate::notes::NoteRepository;
use crate::storage::Storage;

/// State shared by every handler; read-only after startup
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub identities: Arc<dyn IdentityRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub token_header: HeaderName,
}

impl AppState {
    pub fn new(storage: Storage, token_config: TokenConfig, token_header: HeaderName) -> Self {
        let tokens = Arc::new(TokenService::new(token_config));
        let auth = Arc::new(AuthService::new(
            storage.identities.clone(),
            tokens.clone(),
            PasswordPolicy::default(),
        ));

        Self {
            auth,
            tokens,
            identities: storage.identities,
            notes: storage.notes,
            token_header,
        }
    }
}

/// Build the full router
///
/// `/health` and `/api/auth/*` are public; everything else under `/api`
/// passes through the request gate.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let protected = note_routes()
        .merge(search_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_subject));

    let api = Router::new().nest("/auth", auth_routes()).merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// HTTP server bound to a configured address
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        let router = build_router(state, &config.cors_origins);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{}", e))
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "notekeeper listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}
