//! Job repository: CRUD operations for the `jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub source: String,
    pub title: String,
    pub concept: String,
    pub duration_minutes: u32,
    pub status: String,
    pub library_status: Option<String>,
    pub error: Option<String>,
    pub raw_outline_text: String,
    pub refined_title: String,
    /// JSON array of chapter outlines.
    pub outlines: String,
    pub hook: String,
    /// JSON array of chapter texts.
    pub chapters_content: String,
    pub current_task: Option<String>,
    pub words_written: u32,
    pub total_words: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            source: row.get("source")?,
            title: row.get("title")?,
            concept: row.get("concept")?,
            duration_minutes: row.get("duration_minutes")?,
            status: row.get("status")?,
            library_status: row.get("library_status")?,
            error: row.get("error")?,
            raw_outline_text: row.get("raw_outline_text")?,
            refined_title: row.get("refined_title")?,
            outlines: row.get("outlines")?,
            hook: row.get("hook")?,
            chapters_content: row.get("chapters_content")?,
            current_task: row.get("current_task")?,
            words_written: row.get("words_written")?,
            total_words: row.get("total_words")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new job row. It is appended to the end of the queue.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, source, title, concept, duration_minutes, status,
             library_status, error, raw_outline_text, refined_title, outlines, hook,
             chapters_content, current_task, words_written, total_words, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                job.id,
                job.source,
                job.title,
                job.concept,
                job.duration_minutes,
                job.status,
                job.library_status,
                job.error,
                job.raw_outline_text,
                job.refined_title,
                job.outlines,
                job.hook,
                job.chapters_content,
                job.current_task,
                job.words_written,
                job.total_words,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites every mutable column of an existing job. Returns false if the id is unknown.
pub fn update(db: &Database, job: &JobRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET title=?2, concept=?3, duration_minutes=?4, status=?5,
             library_status=?6, error=?7, raw_outline_text=?8, refined_title=?9, outlines=?10,
             hook=?11, chapters_content=?12, current_task=?13, words_written=?14,
             total_words=?15, updated_at=?16
             WHERE id=?1",
            params![
                job.id,
                job.title,
                job.concept,
                job.duration_minutes,
                job.status,
                job.library_status,
                job.error,
                job.raw_outline_text,
                job.refined_title,
                job.outlines,
                job.hook,
                job.chapters_content,
                job.current_task,
                job.words_written,
                job.total_words,
                job.updated_at,
            ],
        )?;
        Ok(changed > 0)
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all jobs in insertion (queue) order.
pub fn list_all(db: &Database) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs ORDER BY seq ASC")?;
        let rows = stmt
            .query_map([], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a job. Returns false if the id is unknown.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}

/// Rewrites every job left in `from_status` to `to_status` with the given error.
/// Returns the number of rows changed.
pub fn reset_status(
    db: &Database,
    from_status: &str,
    to_status: &str,
    error: &str,
    updated_at: &str,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET status = ?2, error = ?3, updated_at = ?4 WHERE status = ?1",
            params![from_status, to_status, error, updated_at],
        )?;
        Ok(changed)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
