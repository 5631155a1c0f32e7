use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use quill_types::api::ErrorBody;
use tracing::error;

/// Every way a request can fail. Handlers return this and nothing else; the
/// status code mapping lives in one place below.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("malformatted id")]
    InvalidId,

    #[error("note not found")]
    NotFound,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("authorization header must be 'Bearer <token>'")]
    MalformedAuthHeader,

    #[error("token invalid or expired")]
    InvalidToken,

    #[error("authentication required")]
    Unauthorized,

    #[error("only the owner may delete this note")]
    Forbidden,

    #[error("username must be unique")]
    UsernameTaken,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::MalformedAuthHeader
            | Self::InvalidToken
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }

        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED && !matches!(self, Self::InvalidCredentials) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_and_absent_ids_map_differently() {
        assert_eq!(ApiError::InvalidId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_hides_details() {
        let err = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn token_failures_challenge_for_bearer() {
        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = ApiError::InvalidCredentials.into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
