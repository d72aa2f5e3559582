//! Credential repository: ordered rows of the `credentials` table.
//!
//! Values are stored as given; sealing and uniqueness live in
//! [`crate::credentials::CredentialStore`].

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub id: i64,
    pub position: i64,
    pub value: String,
    pub encrypted: bool,
    pub created_at: String,
}

impl CredentialRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            position: row.get("position")?,
            value: row.get("value")?,
            encrypted: row.get("encrypted")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// All credentials in rotation order.
pub fn list(db: &Database) -> Result<Vec<CredentialRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM credentials ORDER BY position ASC, id ASC")?;
        let rows = stmt
            .query_map([], CredentialRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Appends a credential at the end of the rotation order.
pub fn append(
    db: &Database,
    value: &str,
    encrypted: bool,
    created_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO credentials (position, value, encrypted, created_at)
             VALUES ((SELECT COALESCE(MAX(position), -1) + 1 FROM credentials), ?1, ?2, ?3)",
            params![value, encrypted, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Deletes one credential row and closes the gap in positions.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_transaction(|conn| {
        let position: Option<i64> = conn
            .query_row(
                "SELECT position FROM credentials WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        let Some(position) = position else {
            return Ok(false);
        };
        conn.execute("DELETE FROM credentials WHERE id = ?1", params![id])?;
        conn.execute(
            "UPDATE credentials SET position = position - 1 WHERE position > ?1",
            params![position],
        )?;
        Ok(true)
    })
}

pub fn count(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM credentials", [], |r| r.get(0))?;
        Ok(n as usize)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-01-01T00:00:00Z";

    #[test]
    fn test_append_keeps_order() {
        let db = Database::open_in_memory().unwrap();
        append(&db, "k1", false, TS).unwrap();
        append(&db, "k2", false, TS).unwrap();
        append(&db, "k3", true, TS).unwrap();

        let rows = list(&db).unwrap();
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["k1", "k2", "k3"]);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[2].position, 2);
        assert!(rows[2].encrypted);
        assert_eq!(count(&db).unwrap(), 3);
    }

    #[test]
    fn test_delete_closes_gap() {
        let db = Database::open_in_memory().unwrap();
        append(&db, "k1", false, TS).unwrap();
        let middle = append(&db, "k2", false, TS).unwrap();
        append(&db, "k3", false, TS).unwrap();

        assert!(delete(&db, middle).unwrap());
        assert!(!delete(&db, middle).unwrap());

        let rows = list(&db).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value, "k3");
        assert_eq!(rows[1].position, 1);

        append(&db, "k4", false, TS).unwrap();
        assert_eq!(list(&db).unwrap()[2].position, 2);
    }
}
