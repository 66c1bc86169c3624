//! # HTTP Server Module
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/auth/*` - Login and registration (public)
//! - `/api/notes/*` - Owner-scoped notes and sharing (gated)
//! - `/api/search` - Identity search (gated)

pub mod auth_routes;
pub mod error;
pub mod extract;
pub mod gate;
pub mod note_routes;
pub mod search_routes;
pub mod server;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath};
pub use gate::Subject;
pub use server::{build_router, AppState, HttpServer};
