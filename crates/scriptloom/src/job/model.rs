//! The job record and its derived word counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Words budgeted for the hook on top of the chapter targets.
pub const HOOK_WORD_ALLOWANCE: u32 = 150;

/// Highest chapter id a job accepts. Outline chapters and merged pieces
/// above it are dropped.
pub const MAX_CHAPTER_ID: u32 = 500;

/// Which flow created a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobSource {
    Manual,
    Automation,
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    /// `PENDING` and `FAILED` jobs may be picked up by the queue.
    pub fn is_eligible(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "RUNNING" => Some(JobStatus::Running),
            "DONE" => Some(JobStatus::Done),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobSource {
    pub fn as_str(self) -> &'static str {
        match self {
            JobSource::Manual => "MANUAL",
            JobSource::Automation => "AUTOMATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(JobSource::Manual),
            "AUTOMATION" => Some(JobSource::Automation),
            _ => None,
        }
    }
}

/// Archive state of a finished script in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryStatus {
    Available,
    Archived,
}

impl LibraryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LibraryStatus::Available => "AVAILABLE",
            LibraryStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(LibraryStatus::Available),
            "ARCHIVED" => Some(LibraryStatus::Archived),
            _ => None,
        }
    }
}

/// One entry of a parsed outline. Id 0 is the hook placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterOutline {
    pub id: u32,
    pub title: String,
    /// Target length; always 0 for the hook placeholder.
    pub word_count: u32,
    pub concept: String,
}

impl ChapterOutline {
    pub fn is_hook(&self) -> bool {
        self.id == 0
    }
}

/// A request to produce one complete script and everything generated for it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub source: JobSource,
    pub created_at: DateTime<Utc>,

    pub title: String,
    pub concept: String,
    pub duration_minutes: u32,

    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_status: Option<LibraryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub raw_outline_text: String,
    #[serde(default)]
    pub refined_title: String,
    #[serde(default)]
    pub outlines: Vec<ChapterOutline>,
    #[serde(default)]
    pub hook: String,
    /// Indexed by chapter id; slot 0 stays empty because the hook has its own field.
    #[serde(default)]
    pub chapters_content: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    pub words_written: u32,
    pub total_words: u32,
}

impl Job {
    /// Creates a fresh `PENDING` job.
    pub fn new(
        source: JobSource,
        title: impl Into<String>,
        concept: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
            created_at: Utc::now(),
            title: title.into(),
            concept: concept.into(),
            duration_minutes,
            status: JobStatus::Pending,
            library_status: None,
            error: None,
            raw_outline_text: String::new(),
            refined_title: String::new(),
            outlines: Vec::new(),
            hook: String::new(),
            chapters_content: Vec::new(),
            current_task: None,
            words_written: 0,
            total_words: 0,
        }
    }

    /// Title to show: the refined one once the outline produced it.
    pub fn display_title(&self) -> &str {
        if self.refined_title.is_empty() {
            &self.title
        } else {
            &self.refined_title
        }
    }

    /// Target words: chapter targets (ids > 0) plus the hook allowance.
    pub fn compute_total_words(&self) -> u32 {
        self.outlines
            .iter()
            .filter(|c| !c.is_hook())
            .fold(HOOK_WORD_ALLOWANCE, |total, c| total.saturating_add(c.word_count))
    }

    /// Words produced so far across the hook and all non-empty chapters.
    pub fn compute_words_written(&self) -> u32 {
        self.chapters_content
            .iter()
            .filter(|c| !c.is_empty())
            .fold(count_words(&self.hook), |total, c| {
                total.saturating_add(count_words(c))
            })
    }

    /// Refreshes both counters from the current content.
    pub fn recompute_counters(&mut self) {
        self.words_written = self.compute_words_written();
        self.total_words = self.compute_total_words();
    }
}

/// Whitespace-separated word count.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
