//! Job store with persistent database storage.
//!
//! The in-memory list is the source of truth for readers; every mutation is
//! written through to SQLite when a database is attached. Jobs are keyed by id,
//! never by position, so deletions between a read and a write are harmless.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{ChapterOutline, Job, JobSource, JobStatus, LibraryStatus};
use super::update::JobUpdate;
use crate::db::job_repo::{self, JobRow};
use crate::db::{Database, DatabaseError};

/// Error recorded on jobs found `RUNNING` when the store is loaded.
pub const INTERRUPTED_ERROR: &str = "Interrupted: process exited while running";

// ─── Row conversion ─────────────────────────────────────────────────────────

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

fn job_to_row(job: &Job) -> Result<JobRow, DatabaseError> {
    let outlines = serde_json::to_string(&job.outlines).map_err(|e| DatabaseError::Json {
        column: "outlines",
        source: e,
    })?;
    let chapters_content =
        serde_json::to_string(&job.chapters_content).map_err(|e| DatabaseError::Json {
            column: "chapters_content",
            source: e,
        })?;

    Ok(JobRow {
        id: job.id.clone(),
        source: job.source.as_str().to_string(),
        title: job.title.clone(),
        concept: job.concept.clone(),
        duration_minutes: job.duration_minutes,
        status: job.status.as_str().to_string(),
        library_status: job.library_status.map(|s| s.as_str().to_string()),
        error: job.error.clone(),
        raw_outline_text: job.raw_outline_text.clone(),
        refined_title: job.refined_title.clone(),
        outlines,
        hook: job.hook.clone(),
        chapters_content,
        current_task: job.current_task.clone(),
        words_written: job.words_written,
        total_words: job.total_words,
        created_at: job.created_at.to_rfc3339(),
        updated_at: Utc::now().to_rfc3339(),
    })
}

fn job_from_row(row: JobRow) -> Result<Job, DatabaseError> {
    let source = JobSource::parse(&row.source).ok_or_else(|| DatabaseError::InvalidValue {
        column: "source",
        value: row.source.clone(),
    })?;
    let status = JobStatus::parse(&row.status).ok_or_else(|| DatabaseError::InvalidValue {
        column: "status",
        value: row.status.clone(),
    })?;
    let library_status = match row.library_status.as_deref() {
        None => None,
        Some(s) => match LibraryStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                log::warn!(
                    "Unknown library status '{}' for job {}, treating as unset",
                    s,
                    row.id
                );
                None
            }
        },
    };
    let outlines: Vec<ChapterOutline> =
        serde_json::from_str(&row.outlines).map_err(|e| DatabaseError::Json {
            column: "outlines",
            source: e,
        })?;
    let chapters_content: Vec<String> =
        serde_json::from_str(&row.chapters_content).map_err(|e| DatabaseError::Json {
            column: "chapters_content",
            source: e,
        })?;

    let mut job = Job {
        id: row.id,
        source,
        created_at: parse_timestamp(&row.created_at),
        title: row.title,
        concept: row.concept,
        duration_minutes: row.duration_minutes,
        status,
        library_status,
        error: row.error,
        raw_outline_text: row.raw_outline_text,
        refined_title: row.refined_title,
        outlines,
        hook: row.hook,
        chapters_content,
        current_task: row.current_task,
        words_written: row.words_written,
        total_words: row.total_words,
    };
    // Stored counters are a cache; the content is the truth.
    job.recompute_counters();
    Ok(job)
}

// ─── JobStore ───────────────────────────────────────────────────────────────

/// Per-status job totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

/// Ordered job collection, optionally persisted.
pub struct JobStore {
    db: Option<Database>,
    jobs: RwLock<Vec<Job>>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    /// Creates an in-memory store with no persistence.
    pub fn new() -> Self {
        Self {
            db: None,
            jobs: RwLock::new(Vec::new()),
        }
    }

    /// Loads every persisted job in queue order.
    ///
    /// Jobs left `RUNNING` by a previous process are marked `FAILED` so the
    /// next automation run picks them up again.
    pub fn load(db: Database) -> Result<Self, DatabaseError> {
        let recovered = job_repo::reset_status(
            &db,
            JobStatus::Running.as_str(),
            JobStatus::Failed.as_str(),
            INTERRUPTED_ERROR,
            &Utc::now().to_rfc3339(),
        )?;
        if recovered > 0 {
            log::warn!(
                "Recovered {} job(s) interrupted by a previous shutdown",
                recovered
            );
        }

        let mut jobs = Vec::new();
        for row in job_repo::list_all(&db)? {
            let id = row.id.clone();
            match job_from_row(row) {
                Ok(job) => jobs.push(job),
                Err(e) => log::error!("Skipping unreadable job {}: {}", id, e),
            }
        }
        log::info!("Loaded {} job(s) from database", jobs.len());

        Ok(Self {
            db: Some(db),
            jobs: RwLock::new(jobs),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Job>> {
        match self.jobs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Job>> {
        match self.jobs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn persist(&self, job: &Job) {
        if let Some(db) = &self.db {
            let result = job_to_row(job).and_then(|row| job_repo::update(db, &row));
            match result {
                Ok(true) => {}
                Ok(false) => log::warn!("Job {} vanished from database before update", job.id),
                Err(e) => log::error!("Failed to persist job {}: {}", job.id, e),
            }
        }
    }

    /// Appends a job to the end of the queue.
    pub fn insert(&self, mut job: Job) -> Result<Job, DatabaseError> {
        job.recompute_counters();
        if let Some(db) = &self.db {
            job_repo::insert(db, &job_to_row(&job)?)?;
        }
        self.write().push(job.clone());
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.read().iter().find(|j| j.id == id).cloned()
    }

    /// Snapshot of every job in queue order.
    pub fn all(&self) -> Vec<Job> {
        self.read().clone()
    }

    /// Read-modify-write of one job by id. Counters are recomputed afterwards.
    ///
    /// Returns the updated job, or `None` when the id no longer exists.
    pub fn update<F>(&self, id: &str, f: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        let updated = {
            let mut jobs = self.write();
            let job = jobs.iter_mut().find(|j| j.id == id)?;
            f(job);
            job.recompute_counters();
            job.clone()
        };
        self.persist(&updated);
        Some(updated)
    }

    /// Applies a pipeline update to one job.
    pub fn apply(&self, id: &str, update: &JobUpdate) -> Option<Job> {
        self.update(id, |job| update.apply_to(job))
    }

    /// Removes a job. Returns false when the id is unknown.
    pub fn remove(&self, id: &str) -> Result<bool, DatabaseError> {
        if let Some(db) = &self.db {
            job_repo::delete(db, id)?;
        }
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }

    /// First automation job that may run, in queue order.
    pub fn next_eligible_automation(&self) -> Option<Job> {
        self.read()
            .iter()
            .find(|j| j.source == JobSource::Automation && j.status.is_eligible())
            .cloned()
    }

    /// Like [`Self::next_eligible_automation`], ignoring the ids in `skip`.
    pub fn next_eligible_automation_except(&self, skip: &HashSet<String>) -> Option<Job> {
        self.read()
            .iter()
            .find(|j| {
                j.source == JobSource::Automation && j.status.is_eligible() && !skip.contains(&j.id)
            })
            .cloned()
    }

    pub fn has_eligible_automation(&self) -> bool {
        self.read()
            .iter()
            .any(|j| j.source == JobSource::Automation && j.status.is_eligible())
    }

    /// Ids of every job currently `RUNNING`.
    pub fn running_ids(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|j| j.status == JobStatus::Running)
            .map(|j| j.id.clone())
            .collect()
    }

    /// Finished scripts, newest first. Archived ones only when asked for.
    pub fn library(&self, show_archived: bool) -> Vec<Job> {
        let mut done: Vec<Job> = self
            .read()
            .iter()
            .filter(|j| j.status == JobStatus::Done)
            .filter(|j| {
                let archived = j.library_status == Some(LibraryStatus::Archived);
                archived == show_archived
            })
            .cloned()
            .collect();
        done.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        done
    }

    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for job in self.read().iter() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
