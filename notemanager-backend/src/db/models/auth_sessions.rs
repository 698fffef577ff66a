//! Auth session database operations

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::db::sqlite::{format_timestamp, parse_timestamp};
use crate::models::Session;
use super::super::{Database, DbError, DbResult};

/// `from + ttl_hours`, rejecting lifetimes chrono cannot represent
fn expiry_after(from: DateTime<Utc>, ttl_hours: i64) -> DbResult<DateTime<Utc>> {
    TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| from.checked_add_signed(ttl))
        .ok_or(DbError::InvalidSessionTtl(ttl_hours))
}

impl Database {
    /// Create a new auth session for a user who just logged in
    pub fn create_session(&self, user_id: i64, ttl_hours: i64) -> DbResult<Session> {
        let created_at = Utc::now();
        let expires_at = expiry_after(created_at, ttl_hours)?;
        let conn = self.conn()?;
        let token = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                token,
                user_id,
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Validate a session token and extend its expiry if valid
    pub fn validate_session(&self, token: &str, ttl_hours: i64) -> DbResult<Option<Session>> {
        let now = Utc::now();
        let new_expires = expiry_after(now, ttl_hours)?;
        let conn = self.conn()?;

        let session = conn
            .query_row(
                "SELECT id, token, user_id, created_at, expires_at FROM auth_sessions
                 WHERE token = ?1 AND expires_at > ?2",
                params![token, format_timestamp(&now)],
                |row| {
                    let created_at_str: String = row.get(3)?;
                    let expires_at_str: String = row.get(4)?;

                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: parse_timestamp(3, &created_at_str)?,
                        expires_at: parse_timestamp(4, &expires_at_str)?,
                    })
                },
            )
            .optional()?;

        // Keep active sessions alive
        let Some(mut session) = session else {
            return Ok(None);
        };
        if let Err(e) = conn.execute(
            "UPDATE auth_sessions SET expires_at = ?1 WHERE id = ?2",
            params![format_timestamp(&new_expires), session.id],
        ) {
            log::warn!("Failed to extend session {}: {}", session.id, e);
        } else {
            session.expires_at = new_expires;
        }

        Ok(Some(session))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired_sessions(&self) -> DbResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            [format_timestamp(&Utc::now())],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, DbError};
    use crate::models::{NewUser, User};

    fn seed_user(db: &Database) -> User {
        db.create_user(&NewUser {
            username: "user".to_string(),
            email: String::new(),
            password_hash: "hash".to_string(),
            is_admin: false,
        })
        .unwrap()
    }

    #[test]
    fn test_session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);

        let session = db.create_session(user.id, 24).unwrap();
        let validated = db.validate_session(&session.token, 24).unwrap().expect("session valid");
        assert_eq!(validated.user_id, user.id);
        assert!(validated.expires_at >= session.expires_at);

        assert!(db.delete_session(&session.token).unwrap());
        assert!(db.validate_session(&session.token, 24).unwrap().is_none());
        assert!(!db.delete_session(&session.token).unwrap());
    }

    #[test]
    fn test_expired_session_rejected_and_purged() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);

        let expired = db.create_session(user.id, -1).unwrap();
        let live = db.create_session(user.id, 24).unwrap();

        assert!(db.validate_session(&expired.token, 24).unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.validate_session(&live.token, 24).unwrap().is_some());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.validate_session("not-a-token", 24).unwrap().is_none());
    }

    #[test]
    fn test_sessions_removed_with_user() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);
        let session = db.create_session(user.id, 24).unwrap();

        db.delete_user(user.id).unwrap();
        assert!(db.validate_session(&session.token, 24).unwrap().is_none());
    }

    #[test]
    fn test_unrepresentable_ttl_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);

        assert!(matches!(
            db.create_session(user.id, i64::MAX),
            Err(DbError::InvalidSessionTtl(i64::MAX))
        ));

        let session = db.create_session(user.id, 24).unwrap();
        assert!(matches!(
            db.validate_session(&session.token, i64::MAX),
            Err(DbError::InvalidSessionTtl(_))
        ));
        // The failed extension left the session untouched
        assert!(db.validate_session(&session.token, 24).unwrap().is_some());
    }
}
