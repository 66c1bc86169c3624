//! Auth HTTP Routes
//!
//! Public endpoints: the request gate does not run here.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use super::error::ApiError;
use super::extract::ApiJson;
use super::server::AppState;
use crate::auth::identity::IdentitySummary;
use crate::auth::token::TokenResponse;
use crate::auth::{Credential, RegisterRequest};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/register", post(register_handler))
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub identity: IdentitySummary,
    #[serde(flatten)]
    pub token: TokenResponse,
}

/// Exchange a credential for a session token
async fn login_handler(
    State(state): State<AppState>,
    ApiJson(credential): ApiJson<Credential>,
) -> Result<Json<TokenResponse>, ApiError> {
    let issued = state.auth.authenticate(credential).await?;
    Ok(Json(TokenResponse::from(issued)))
}

async fn register_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (identity, issued) = state.auth.register(request).await?;

    let response = RegisterResponse {
        identity: identity.summary(),
        token: TokenResponse::from(issued),
    };
    Ok((StatusCode::CREATED, Json(response)))
}
