pub mod auth;
pub mod error;
pub mod middleware;
pub mod notes;
pub mod password;
pub mod users;

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use tracing::error;

use quill_types::api::ErrorBody;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;
use crate::middleware::require_auth;

/// All routes, with the bearer-token guard on the mutating note endpoints.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/users", post(users::register).get(users::list_users))
        .route("/notes", get(notes::list_notes))
        .route("/notes/{id}", get(notes::get_note))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/notes", post(notes::create_note))
        .route("/notes/{id}", delete(notes::delete_note))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(unknown_endpoint)
        .with_state(state)
}

/// GET /health — liveness check (no auth).
async fn health() -> &'static str {
    "ok"
}

async fn unknown_endpoint() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "unknown endpoint".into(),
        }),
    )
}

/// Run store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("blocking task failed: {}", e))
        })?
}

pub(crate) fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}
