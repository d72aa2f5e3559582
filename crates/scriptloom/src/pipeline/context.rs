use crate::job::{ChapterOutline, Job};

use super::error::PipelineWarning;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub title: String,
    pub concept: String,
    pub duration_minutes: u32,
}

impl GenerationRequest {
    pub fn new(title: impl Into<String>, concept: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            title: title.into(),
            concept: concept.into(),
            duration_minutes,
        }
    }

    pub fn from_job(job: &Job) -> Self {
        Self::new(job.title.clone(), job.concept.clone(), job.duration_minutes)
    }
}

/// Summary of a finished run. The content itself reaches the caller through
/// the progress reporter.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub refined_title: String,
    pub outlines: Vec<ChapterOutline>,
    pub batches_written: usize,
    /// Number of batch calls whose result was discarded because a pause
    /// arrived while the call was in flight.
    pub batches_repeated: usize,
    // Non-fatal warnings
    pub warnings: Vec<PipelineWarning>,
}
