use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::AppState;
use crate::error::ApiError;

/// Validate the bearer token on a protected route and stash its claims in
/// the request extensions for the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state
        .tokens
        .authenticate(req.headers().get(header::AUTHORIZATION))
        .inspect_err(|e| warn!("Rejected {} {}: {}", req.method(), req.uri().path(), e))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
