//! Note database operations.
//!
//! Every query here takes a [`NoteScope`] and filters on the owner column, so
//! a note outside the caller's scope behaves exactly like a missing one.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::sqlite::{format_timestamp, parse_timestamp};
use crate::models::{NewNote, Note, NoteChanges, UserResponse};
use crate::policy::NoteScope;
use super::super::{Database, DbError, DbResult};

const NOTE_SELECT: &str = "SELECT n.id, n.title, n.description, n.created_at, n.updated_at,
        u.id, u.username, u.email
    FROM notes n
    JOIN users u ON u.id = n.user_id";

/// Ownership predicate; `?1` is always bound to the scope's owner id
const OWNER_FILTER: &str = "n.user_id = ?1";

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let created_at_str: String = row.get(3)?;
    let updated_at_str: String = row.get(4)?;
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_timestamp(3, &created_at_str)?,
        updated_at: parse_timestamp(4, &updated_at_str)?,
        owner: UserResponse {
            id: row.get(5)?,
            username: row.get(6)?,
            email: row.get(7)?,
        },
    })
}

fn query_note(conn: &Connection, scope: &NoteScope, id: i64) -> rusqlite::Result<Option<Note>> {
    conn.query_row(
        &format!("{NOTE_SELECT} WHERE {OWNER_FILTER} AND n.id = ?2"),
        params![scope.owner_id(), id],
        row_to_note,
    )
    .optional()
}

impl Database {
    /// Create a note owned by the scope's user
    pub fn create_note(&self, scope: &NoteScope, new_note: &NewNote) -> DbResult<Note> {
        let conn = self.conn()?;
        let now = format_timestamp(&Utc::now());

        conn.execute(
            "INSERT INTO notes (title, description, created_at, updated_at, user_id)
             VALUES (?1, ?2, ?3, ?3, ?4)",
            params![new_note.title, new_note.description, now, scope.owner_id()],
        )?;

        let id = conn.last_insert_rowid();
        query_note(&conn, scope, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Notes in scope, ordered by id
    pub fn list_notes(&self, scope: &NoteScope) -> DbResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT} WHERE {OWNER_FILTER} ORDER BY n.id"))?;
        let notes = stmt
            .query_map([scope.owner_id()], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    pub fn get_note(&self, scope: &NoteScope, id: i64) -> DbResult<Option<Note>> {
        let conn = self.conn()?;
        Ok(query_note(&conn, scope, id)?)
    }

    /// Apply a partial update and refresh `updated_at`.
    /// Returns `None` when the note is missing or outside the scope.
    pub fn update_note(
        &self,
        scope: &NoteScope,
        id: i64,
        changes: &NoteChanges,
    ) -> DbResult<Option<Note>> {
        let conn = self.conn()?;
        let now = format_timestamp(&Utc::now());

        let rows = conn.execute(
            "UPDATE notes SET
                title = COALESCE(?3, title),
                description = COALESCE(?4, description),
                updated_at = ?5
             WHERE user_id = ?1 AND id = ?2",
            params![scope.owner_id(), id, changes.title, changes.description, now],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        Ok(query_note(&conn, scope, id)?)
    }

    /// Delete a note in scope. Returns false when nothing matched.
    pub fn delete_note(&self, scope: &NoteScope, id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM notes WHERE user_id = ?1 AND id = ?2",
            params![scope.owner_id(), id],
        )?;
        Ok(rows_affected > 0)
    }
}
