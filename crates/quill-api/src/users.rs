use std::collections::HashMap;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use quill_db::Database;
use quill_types::api::{RegisterRequest, UserResponse};
use quill_types::models::User;
use quill_types::{NoteId, UserId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::password;
use crate::{bad_body, run_blocking};

/// Create a user with a hashed password.
pub fn register_user(db: &Database, req: RegisterRequest) -> Result<User, ApiError> {
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    if db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password_hash = password::hash_password(&req.password)?;
    let id = UserId::new();

    // A concurrent registration can still win the race; the UNIQUE
    // constraint catches it.
    if !db.create_user(&id.to_string(), &req.username, &req.name, &password_hash)? {
        return Err(ApiError::UsernameTaken);
    }

    Ok(User {
        id,
        username: req.username,
        name: req.name,
    })
}

/// Every user together with the ids of the notes they own.
pub fn list_with_notes(db: &Database) -> Result<Vec<UserResponse>, ApiError> {
    let mut owned: HashMap<String, Vec<NoteId>> = HashMap::new();
    for (user_id, note_id) in db.note_ids_by_user()? {
        match note_id.parse() {
            Ok(id) => owned.entry(user_id).or_default().push(id),
            Err(e) => warn!("Corrupt note id '{}': {}", note_id, e),
        }
    }

    let users = db
        .list_users()?
        .into_iter()
        .filter_map(|row| match row.id.parse::<UserId>() {
            Ok(id) => Some(UserResponse {
                id,
                notes: owned.remove(&row.id).unwrap_or_default(),
                username: row.username,
                name: row.name,
            }),
            Err(e) => {
                warn!("Corrupt user id '{}': {}", row.id, e);
                None
            }
        })
        .collect();

    Ok(users)
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(bad_body)?;

    let user = run_blocking(&state, move |state| register_user(&state.db, req)).await?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = run_blocking(&state, |state| list_with_notes(&state.db)).await?;
    Ok(Json(users))
}
