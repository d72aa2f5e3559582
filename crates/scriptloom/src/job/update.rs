//! Partial updates applied to a job record while a script is generated.
//!
//! An update is either a plain partial record ([`JobPatch`]) or an explicit
//! merge into the previous chapters array, so a late batch can never erase
//! content written by an earlier one.

use super::model::{ChapterOutline, Job, MAX_CHAPTER_ID};

/// Plain partial record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub raw_outline_text: Option<String>,
    pub refined_title: Option<String>,
    pub outlines: Option<Vec<ChapterOutline>>,
    pub chapters_content: Option<Vec<String>>,
    pub hook: Option<String>,
    pub current_task: Option<String>,
}

/// One incremental change emitted by the generation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Patch(JobPatch),
    /// `(chapter id, text)` pairs written into the existing chapters array.
    MergeChapters(Vec<(u32, String)>),
    /// New human-readable task label.
    Task(String),
}

impl JobUpdate {
    /// Applies the update and refreshes the derived counters.
    pub fn apply_to(&self, job: &mut Job) {
        match self {
            JobUpdate::Patch(patch) => {
                if let Some(text) = &patch.raw_outline_text {
                    job.raw_outline_text = text.clone();
                }
                if let Some(title) = &patch.refined_title {
                    job.refined_title = title.clone();
                }
                if let Some(outlines) = &patch.outlines {
                    job.outlines = outlines.clone();
                }
                if let Some(chapters) = &patch.chapters_content {
                    job.chapters_content = chapters.clone();
                }
                if let Some(hook) = &patch.hook {
                    job.hook = hook.clone();
                }
                if let Some(task) = &patch.current_task {
                    job.current_task = Some(task.clone());
                }
            }
            JobUpdate::MergeChapters(pieces) => {
                for (id, text) in pieces {
                    if text.is_empty() {
                        continue;
                    }
                    if *id > MAX_CHAPTER_ID {
                        log::warn!("Dropping text for out-of-range chapter {}", id);
                        continue;
                    }
                    let idx = *id as usize;
                    if job.chapters_content.len() <= idx {
                        job.chapters_content.resize(idx + 1, String::new());
                    }
                    job.chapters_content[idx] = text.clone();
                }
            }
            JobUpdate::Task(task) => {
                job.current_task = Some(task.clone());
            }
        }
        job.recompute_counters();
    }
}
