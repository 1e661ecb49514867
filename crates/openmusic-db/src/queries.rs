use crate::models::{RefreshTokenRow, UserRow};
use crate::{Database, OptionalExt};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_username(conn, username))
    }
}

// -- Users --

pub fn insert_user(
    conn: &Connection,
    id: &str,
    username: &str,
    password_hash: &str,
    fullname: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, password, fullname) VALUES (?1, ?2, ?3, ?4)",
        (id, username, password_hash, fullname),
    )?;
    Ok(())
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, fullname FROM users WHERE username = ?1")?;

    stmt.query_row([username], map_user).optional()
}

pub fn user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, fullname FROM users WHERE id = ?1")?;

    stmt.query_row([id], map_user).optional()
}

pub fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub fn count_users_named(conn: &Connection, username: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        fullname: row.get(3)?,
    })
}

// -- Refresh tokens --

pub fn insert_refresh_token(
    conn: &Connection,
    token: &str,
    user_id: &str,
    expires_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![token, user_id, expires_at],
    )?;
    Ok(())
}

pub fn refresh_token(conn: &Connection, token: &str) -> Result<Option<RefreshTokenRow>> {
    conn.query_row(
        "SELECT token, user_id, expires_at FROM refresh_tokens WHERE token = ?1",
        [token],
        |row| {
            Ok(RefreshTokenRow {
                token: row.get(0)?,
                user_id: row.get(1)?,
                expires_at: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Returns the number of rows removed (0 or 1).
pub fn delete_refresh_token(conn: &Connection, token: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM refresh_tokens WHERE token = ?1", [token])?;
    Ok(removed)
}

/// Drops a user's refresh tokens whose expiry (unix seconds) is at or before `now`.
pub fn purge_expired_refresh_tokens(conn: &Connection, user_id: &str, now: i64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM refresh_tokens WHERE user_id = ?1 AND expires_at <= ?2",
        rusqlite::params![user_id, now],
    )?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| insert_user(conn, "user-1", "alice", "hash", "Alice Liddell"))
            .unwrap();
        db
    }

    #[test]
    fn user_lookup_by_name_and_id() {
        let db = db_with_user();

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, "user-1");
        assert_eq!(by_name.fullname, "Alice Liddell");

        db.with_conn(|conn| {
            assert!(user_by_id(conn, "user-1")?.is_some());
            assert!(user_by_id(conn, "user-404")?.is_none());
            anyhow::Ok(())
        })
        .unwrap();
    }

    #[test]
    fn expired_refresh_tokens_are_purged_per_user() {
        let db = db_with_user();
        db.with_conn(|conn| {
            insert_refresh_token(conn, "old", "user-1", 100)?;
            insert_refresh_token(conn, "fresh", "user-1", 10_000)?;
            purge_expired_refresh_tokens(conn, "user-1", 5_000)
        })
        .unwrap();

        db.with_conn(|conn| {
            assert!(refresh_token(conn, "old")?.is_none());
            assert_eq!(refresh_token(conn, "fresh")?.unwrap().user_id, "user-1");
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn deleting_unknown_token_removes_nothing() {
        let db = db_with_user();
        let removed = db.with_conn(|conn| delete_refresh_token(conn, "nope")).unwrap();
        assert_eq!(removed, 0);
    }
}
