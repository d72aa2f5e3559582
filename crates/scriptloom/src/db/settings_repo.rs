//! Key/value settings (`settings` table).

use rusqlite::params;

use super::{Database, DatabaseError};

/// Key under which the rotation cursor is persisted.
pub const ROTATION_CURSOR_KEY: &str = "rotation_cursor";

pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |r| r.get::<_, String>(0))?;
        match rows.next() {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn set(db: &Database, key: &str, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    })
}

/// Reads an integer setting. Unparseable values are logged and treated as absent.
pub fn get_usize(db: &Database, key: &str) -> Result<Option<usize>, DatabaseError> {
    Ok(get(db, key)?.and_then(|raw| match raw.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(e) => {
            log::warn!("Ignoring invalid setting {}='{}': {}", key, raw, e);
            None
        }
    }))
}
