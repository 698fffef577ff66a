use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserResponse;

/// A note joined with its owner, as read from the store
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: UserResponse,
}

/// Public representation of a note with its owner nested (read-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            created_at: note.created_at,
            updated_at: note.updated_at,
            user: note.owner,
        }
    }
}

/// Body for creating a note or replacing it via PUT.
///
/// Only `title` and `description` are accepted. Anything else in the body
/// (an owner, timestamps, an id) is ignored by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Partial update of a note (PATCH)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Validated note fields for insertion
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub description: String,
}

/// Validated partial note fields
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}
