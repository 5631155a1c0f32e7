use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use quill_db::Database;
use quill_db::models::NoteRow;
use quill_types::api::{Claims, CreateNoteRequest};
use quill_types::models::Note;
use quill_types::NoteId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{bad_body, run_blocking};

// ── Note service ────────────────────────────────────────────────────────

/// Every stored note, in store order.
pub fn list_all(db: &Database) -> Result<Vec<Note>, ApiError> {
    let notes = db
        .list_notes()?
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            note_from_row(row)
                .inspect_err(|e| warn!("Skipping corrupt note '{}': {:#}", id, e))
                .ok()
        })
        .collect();
    Ok(notes)
}

pub fn find(db: &Database, raw_id: &str) -> Result<Note, ApiError> {
    let id = parse_note_id(raw_id)?;
    let row = db.get_note(&id.to_string())?.ok_or(ApiError::NotFound)?;
    Ok(note_from_row(row)?)
}

/// Store a new note owned by the token's subject. Ownership always comes
/// from the claims, never from the request body.
pub fn create(db: &Database, claims: &Claims, req: CreateNoteRequest) -> Result<Note, ApiError> {
    let content = req
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("content missing".into()))?;

    let id = NoteId::new();
    let row = db
        .insert_note(&id.to_string(), &content, req.important, &claims.sub.to_string())?
        .ok_or_else(|| {
            warn!("Token subject {} no longer exists", claims.sub);
            ApiError::Unauthorized
        })?;

    Ok(note_from_row(row)?)
}

/// Delete a note if it exists and belongs to the token's subject. A note
/// that is already gone counts as deleted.
pub fn remove(db: &Database, claims: &Claims, raw_id: &str) -> Result<(), ApiError> {
    let id = parse_note_id(raw_id)?;

    let Some(row) = db.get_note(&id.to_string())? else {
        return Ok(());
    };
    let note = note_from_row(row)?;

    if !note.is_owned_by(claims.sub) {
        return Err(ApiError::Forbidden);
    }

    db.delete_note(&id.to_string())?;
    Ok(())
}

fn parse_note_id(raw: &str) -> Result<NoteId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId)
}

fn note_from_row(row: NoteRow) -> anyhow::Result<Note> {
    Ok(Note {
        id: row
            .id
            .parse()
            .map_err(|e| anyhow!("Corrupt note id '{}': {}", row.id, e))?,
        user: row
            .user_id
            .parse()
            .map_err(|e| anyhow!("Corrupt user_id '{}' on note '{}': {}", row.user_id, row.id, e))?,
        content: row.content,
        important: row.important,
    })
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /notes
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = run_blocking(&state, |state| list_all(&state.db)).await?;
    Ok(Json(notes))
}

/// GET /notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = run_blocking(&state, move |state| find(&state.db, &id)).await?;
    Ok(Json(note))
}

/// POST /notes
pub async fn create_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(bad_body)?;

    let username = claims.username.clone();
    let note = run_blocking(&state, move |state| create(&state.db, &claims, req)).await?;

    info!("Note {} created by {}", note.id, username);
    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let username = claims.username.clone();
    let deleted = id.clone();
    run_blocking(&state, move |state| remove(&state.db, &claims, &id)).await?;

    info!("Note {} deleted by {}", deleted, username);
    Ok(StatusCode::NO_CONTENT)
}
