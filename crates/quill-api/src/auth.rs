use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, info};

use quill_db::Database;
use quill_types::UserId;
use quill_types::api::{Claims, LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::password;
use crate::{bad_body, run_blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: Authenticator,
}

/// Issues and verifies signed bearer tokens. Holds the server secret and the
/// token lifetime; keeps no record of what it has issued.
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: UserId, username: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issue a token as if it were `issued_at`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> anyhow::Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow!("Token lifetime {} overflows the clock", self.ttl))?;

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry and return the embedded claims. Never
    /// consults the user store.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        // Expired means expired: no grace period past `exp`.
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ApiError::InvalidToken
            })
    }

    /// Authenticate the value of an `Authorization` header.
    pub fn authenticate(&self, header: Option<&HeaderValue>) -> Result<Claims, ApiError> {
        let header = header.ok_or(ApiError::Unauthorized)?;
        let token = header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::MalformedAuthHeader)?;
        self.verify(token)
    }
}

/// Check a username/password pair and issue a token for it.
///
/// Unknown usernames and wrong passwords produce the same error, and take
/// roughly the same time.
pub fn login_user(
    db: &Database,
    tokens: &Authenticator,
    username: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    let Some(user) = db.get_user_by_username(username)? else {
        password::verify_against_dummy(password);
        return Err(ApiError::InvalidCredentials);
    };

    if !password::verify_password(password, &user.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let user_id: UserId = user
        .id
        .parse()
        .map_err(|e| anyhow!("Corrupt user id '{}': {}", user.id, e))?;
    let token = tokens.issue(user_id, &user.username)?;

    Ok(LoginResponse {
        token,
        username: user.username,
        name: user.name,
    })
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body.map_err(bad_body)?;

    let response = run_blocking(&state, move |state| {
        login_user(&state.db, &state.tokens, &req.username, &req.password)
    })
    .await?;

    info!("User {} logged in", response.username);
    Ok(Json(response))
}
