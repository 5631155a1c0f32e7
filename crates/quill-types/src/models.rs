use serde::{Deserialize, Serialize};

use crate::ids::{NoteId, UserId};

/// A registered user, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
}

/// A stored note. `user` is the owner and never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub important: bool,
    pub user: UserId,
}

impl Note {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user == user
    }
}
