//! Request Gate
//!
//! Middleware in front of every protected route. It reads the raw token from
//! the configured header, verifies it and stores the [`Subject`] in the
//! request extensions for the handler.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;

/// The verified identity behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub Uuid);

impl Subject {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

/// Reject requests without a valid token; attach the subject otherwise
pub async fn require_subject(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(&state.token_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        warn!(path = %request.uri().path(), "missing token");
        return Err(ApiError::MissingToken);
    };

    let subject = state.tokens.verify(token).map_err(|_| {
        warn!(path = %request.uri().path(), "invalid token");
        ApiError::InvalidToken
    })?;

    request.extensions_mut().insert(Subject(subject));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Subject>()
            .copied()
            .ok_or(ApiError::MissingToken)
    }
}
