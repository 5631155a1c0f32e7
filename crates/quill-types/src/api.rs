use serde::{Deserialize, Serialize};

use crate::ids::{NoteId, UserId};

// -- Token claims --

/// Claims carried by a bearer token. `sub` is the identity of the user who
/// logged in; nothing else about the user is trusted from the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub notes: Vec<NoteId>,
}

// -- Notes --

/// Body of `POST /notes`. Missing `content` is reported as a validation
/// failure rather than a deserialization one; any client-supplied owner
/// field is dropped here.
#[derive(Debug, Default, Deserialize)]
pub struct CreateNoteRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub important: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
