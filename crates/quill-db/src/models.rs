//! Database row types. These map directly to SQLite rows and stay free of
//! the API's typed identifiers so the store layer has no upward dependency.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: String,
    pub content: String,
    pub important: bool,
    pub user_id: String,
    pub created_at: String,
}
