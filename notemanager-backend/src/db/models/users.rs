//! User account database operations

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::sqlite::{format_timestamp, parse_timestamp, unique_violation};
use crate::models::{NewUser, User, UserChanges};
use super::super::{Database, DbResult};

const USER_COLUMNS: &str = "id, username, email, is_admin, password_hash, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        is_admin: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: parse_timestamp(5, &created_at_str)?,
    })
}

fn query_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        row_to_user,
    )
    .optional()
}

impl Database {
    /// Insert a new user. A taken username yields `DbError::Duplicate("username")`.
    pub fn create_user(&self, new_user: &NewUser) -> DbResult<User> {
        let conn = self.conn()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (username, email, is_admin, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new_user.username,
                new_user.email,
                new_user.is_admin,
                new_user.password_hash,
                format_timestamp(&created_at),
            ],
        )
        .map_err(|e| unique_violation(e, "username"))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            is_admin: new_user.is_admin,
            password_hash: new_user.password_hash.clone(),
            created_at,
        })
    }

    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        Ok(query_user(&conn, id)?)
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// All users, ordered by id
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Apply a partial update. Returns `None` when no user has this id.
    pub fn update_user(&self, id: i64, changes: &UserChanges) -> DbResult<Option<User>> {
        let conn = self.conn()?;

        if !changes.is_empty() {
            let rows = conn
                .execute(
                    "UPDATE users SET
                        username = COALESCE(?1, username),
                        email = COALESCE(?2, email),
                        password_hash = COALESCE(?3, password_hash)
                     WHERE id = ?4",
                    params![changes.username, changes.email, changes.password_hash, id],
                )
                .map_err(|e| unique_violation(e, "username"))?;
            if rows == 0 {
                return Ok(None);
            }
        }

        Ok(query_user(&conn, id)?)
    }

    /// Delete a user; their notes and sessions go with them
    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}
