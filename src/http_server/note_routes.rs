//! Note HTTP Routes
//!
//! Every handler is scoped to the gate's [`Subject`]; a note owned by anyone
//! else answers 404.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::error::ApiError;
use super::extract::{ApiJson, ApiPath};
use super::gate::Subject;
use super::server::AppState;
use crate::auth::identity::{normalize_email, IdentitySummary};
use crate::notes::{NewNote, Note, NoteId, NoteUpdate, ShareOutcome};

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/shared", get(list_shared_notes))
        .route(
            "/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/notes/:id/share", post(share_note))
        .route("/notes/:id/shares", get(list_shares))
        .route("/notes/:id/share/:identity_id", delete(unshare_note))
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn list_notes(
    State(state): State<AppState>,
    subject: Subject,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.list_owned(subject.id()).await?))
}

async fn list_shared_notes(
    State(state): State<AppState>,
    subject: Subject,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.list_shared_with(subject.id()).await?))
}

async fn get_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath(id): ApiPath<NoteId>,
) -> Result<Json<Note>, ApiError> {
    state
        .notes
        .find_owned(id, subject.id())
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("note"))
}

#[instrument(skip_all, fields(subject = %subject.id()))]
async fn create_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiJson(note): ApiJson<NewNote>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    note.validate().map_err(ApiError::BadRequest)?;

    let created = state.notes.create(subject.id(), note).await?;
    info!(note = created.id, "note created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath(id): ApiPath<NoteId>,
    ApiJson(update): ApiJson<NoteUpdate>,
) -> Result<StatusCode, ApiError> {
    if state.notes.find_owned(id, subject.id()).await?.is_none() {
        return Err(ApiError::NotFound("note"));
    }
    update.validate().map_err(ApiError::BadRequest)?;

    if state.notes.update_owned(id, subject.id(), update).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("note"))
    }
}

#[instrument(skip_all, fields(subject = %subject.id(), note = id))]
async fn delete_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath(id): ApiPath<NoteId>,
) -> Result<StatusCode, ApiError> {
    if state.notes.delete_owned(id, subject.id()).await? {
        info!("note deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("note"))
    }
}

#[instrument(skip_all, fields(subject = %subject.id(), note = id))]
async fn share_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath(id): ApiPath<NoteId>,
    ApiJson(request): ApiJson<ShareRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = state
        .identities
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or(ApiError::NotFound("identity"))?;

    if target.id == subject.id() {
        return Err(ApiError::BadRequest(
            "cannot share a note with its owner".to_string(),
        ));
    }

    let message = match state.notes.add_share(id, subject.id(), target.id).await? {
        ShareOutcome::NoteNotFound => return Err(ApiError::NotFound("note")),
        ShareOutcome::Added => {
            info!(shared_with = %target.id, "note shared");
            format!("note shared with {}", target.username)
        }
        ShareOutcome::AlreadyShared => format!("note already shared with {}", target.username),
    };

    Ok(Json(MessageResponse { message }))
}

async fn list_shares(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath(id): ApiPath<NoteId>,
) -> Result<Json<Vec<IdentitySummary>>, ApiError> {
    let shares = state
        .notes
        .list_shares(id, subject.id())
        .await?
        .ok_or(ApiError::NotFound("note"))?;

    let mut summaries = Vec::with_capacity(shares.len());
    for share in shares {
        if let Some(identity) = state.identities.find_by_id(share.shared_with).await? {
            summaries.push(identity.summary());
        }
    }
    Ok(Json(summaries))
}

async fn unshare_note(
    State(state): State<AppState>,
    subject: Subject,
    ApiPath((id, identity_id)): ApiPath<(NoteId, Uuid)>,
) -> Result<StatusCode, ApiError> {
    if state.notes.remove_share(id, subject.id(), identity_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("share"))
    }
}
