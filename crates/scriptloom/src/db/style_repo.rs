//! Thumbnail style profiles (`thumbnail_styles` table).
//!
//! The analysis payload is opaque JSON owned by whoever produced it.

use chrono::Utc;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Database, DatabaseError};

/// A named image style: a master prompt plus whatever analysis produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailStyle {
    pub id: String,
    pub name: String,
    pub master_prompt: String,
    #[serde(default)]
    pub analysis: serde_json::Value,
    pub created_at: String,
}

impl ThumbnailStyle {
    pub fn new(name: impl Into<String>, master_prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            master_prompt: master_prompt.into(),
            analysis: serde_json::Value::Object(Default::default()),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let analysis: String = row.get("analysis")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            master_prompt: row.get("master_prompt")?,
            analysis: serde_json::from_str(&analysis).unwrap_or_else(|e| {
                log::warn!("Style analysis is not valid JSON, ignoring: {}", e);
                serde_json::Value::Null
            }),
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts or replaces a style by name.
pub fn upsert(db: &Database, style: &ThumbnailStyle) -> Result<(), DatabaseError> {
    let analysis = serde_json::to_string(&style.analysis).map_err(|e| DatabaseError::Json {
        column: "analysis",
        source: e,
    })?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO thumbnail_styles (id, name, master_prompt, analysis, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO UPDATE SET master_prompt = excluded.master_prompt,
             analysis = excluded.analysis",
            params![
                style.id,
                style.name,
                style.master_prompt,
                analysis,
                style.created_at
            ],
        )?;
        Ok(())
    })
}

pub fn list(db: &Database) -> Result<Vec<ThumbnailStyle>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM thumbnail_styles ORDER BY name ASC")?;
        let rows = stmt
            .query_map([], ThumbnailStyle::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn find_by_name(db: &Database, name: &str) -> Result<Option<ThumbnailStyle>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM thumbnail_styles WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![name], ThumbnailStyle::from_row)?;
        match rows.next() {
            Some(Ok(style)) => Ok(Some(style)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn delete_by_name(db: &Database, name: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM thumbnail_styles WHERE name = ?1",
            params![name],
        )?;
        Ok(changed > 0)
    })
}
