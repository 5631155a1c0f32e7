use crate::Database;
use crate::models::{NoteRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, username, name, password, created_at";
const NOTE_COLUMNS: &str = "id, content, important, user_id, created_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` if the username is already taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, name, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, name, password_hash),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notes --

    /// Insert a note owned by `user_id`, checking in the same critical
    /// section that the owner exists. Returns `None` if it does not.
    pub fn insert_note(
        &self,
        id: &str,
        content: &str,
        important: bool,
        user_id: &str,
    ) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            if query_user(conn, "id", user_id)?.is_none() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO notes (id, content, important, user_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, content, important, user_id],
            )?;

            query_note(conn, id)
        })
    }

    pub fn list_notes(&self) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY rowid"))?;
            let rows = stmt
                .query_map([], note_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_note(&self, id: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| query_note(conn, id))
    }

    /// Delete a note by id. Returns whether a row was removed.
    pub fn delete_note(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    pub fn count_notes(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))?;
            Ok(count as usize)
        })
    }

    /// All `(user_id, note_id)` pairs, in insertion order.
    pub fn note_ids_by_user(&self) -> Result<Vec<(String, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id, id FROM notes ORDER BY rowid")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_note(conn: &Connection, id: &str) -> Result<Option<NoteRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"))?;
    let row = stmt.query_row([id], note_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        content: row.get(1)?,
        important: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "00000000-0000-0000-0000-00000000000a";
    const BOB: &str = "00000000-0000-0000-0000-00000000000b";

    fn db_with_users() -> Database {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user(ALICE, "alice", "Alice", "hash-a").unwrap());
        assert!(db.create_user(BOB, "bob", "Bob", "hash-b").unwrap());
        db
    }

    #[test]
    fn duplicate_username_is_reported() {
        let db = db_with_users();
        let taken = db
            .create_user("00000000-0000-0000-0000-00000000000c", "alice", "Other", "x")
            .unwrap();
        assert!(!taken);
        assert_eq!(db.list_users().unwrap().len(), 2);
    }

    #[test]
    fn user_lookup() {
        let db = db_with_users();
        let alice = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(alice.id, ALICE);
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.password, "hash-a");
        assert!(db.get_user_by_id(BOB).unwrap().is_some());
        assert!(db.get_user_by_username("carol").unwrap().is_none());
    }

    #[test]
    fn insert_get_delete_note() {
        let db = db_with_users();
        let id = "10000000-0000-0000-0000-000000000001";

        let row = db.insert_note(id, "HTML is easy", true, ALICE).unwrap().unwrap();
        assert_eq!(row.content, "HTML is easy");
        assert!(row.important);
        assert_eq!(row.user_id, ALICE);
        assert_eq!(db.get_note(id).unwrap(), Some(row));
        assert_eq!(db.count_notes().unwrap(), 1);

        assert!(db.delete_note(id).unwrap());
        assert!(!db.delete_note(id).unwrap());
        assert!(db.get_note(id).unwrap().is_none());
        assert_eq!(db.count_notes().unwrap(), 0);
    }

    #[test]
    fn insert_note_for_missing_owner() {
        let db = db_with_users();
        let row = db
            .insert_note(
                "10000000-0000-0000-0000-000000000002",
                "orphan",
                false,
                "00000000-0000-0000-0000-0000000000ff",
            )
            .unwrap();
        assert!(row.is_none());
        assert_eq!(db.count_notes().unwrap(), 0);
    }

    #[test]
    fn notes_listed_in_insertion_order() {
        let db = db_with_users();
        db.insert_note("10000000-0000-0000-0000-000000000003", "first", false, ALICE).unwrap();
        db.insert_note("10000000-0000-0000-0000-000000000004", "second", false, BOB).unwrap();

        let contents: Vec<_> = db.list_notes().unwrap().into_iter().map(|n| n.content).collect();
        assert_eq!(contents, vec!["first", "second"]);

        let pairs = db.note_ids_by_user().unwrap();
        assert_eq!(pairs[0].0, ALICE);
        assert_eq!(pairs[1].0, BOB);
    }
}
