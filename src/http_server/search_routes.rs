//! Identity search

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::error::ApiError;
use super::gate::Subject;
use super::server::AppState;
use crate::auth::identity::IdentitySummary;

/// Maximum number of identities returned per search
pub const SEARCH_LIMIT: usize = 50;

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search", get(search_handler))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Substring match on usernames, public fields only
async fn search_handler(
    State(state): State<AppState>,
    _subject: Subject,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<IdentitySummary>>, ApiError> {
    let fragment = params.q.trim();
    if fragment.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let found = state
        .identities
        .search_by_username(fragment, SEARCH_LIMIT)
        .await?;
    Ok(Json(found))
}
