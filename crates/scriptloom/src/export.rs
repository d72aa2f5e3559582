//! Script assembly for copying out of the library.
//!
//! Chapter bodies often start with their own `Chapter N: Title` heading; it is
//! stripped here, at export time, so stored content stays as generated.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::job::Job;

static RE_CHAPTER_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A\s*Chapter\s+\d+:[^\n]*(\n+|\z)").unwrap());

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Job {job_id} has no content for the {part} export")]
    NothingToExport { job_id: String, part: ExportPart },
}

/// Which slice of a script to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPart {
    /// Hook and every chapter.
    Full,
    /// Hook and chapter 1.
    HookAndFirstChapter,
    /// Chapters 2 onwards.
    Rest,
}

impl std::fmt::Display for ExportPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportPart::Full => write!(f, "full"),
            ExportPart::HookAndFirstChapter => write!(f, "hook"),
            ExportPart::Rest => write!(f, "rest"),
        }
    }
}

/// Removes one leading `Chapter N: ...` heading line and trims the result.
pub fn strip_chapter_heading(text: &str) -> String {
    RE_CHAPTER_HEADING.replacen(text, 1, "").trim().to_string()
}

pub fn full_script(job: &Job) -> String {
    let mut parts = vec![job.hook.trim().to_string()];
    parts.extend(chapter_bodies(job, 1));
    join(parts)
}

pub fn hook_and_first_chapter(job: &Job) -> String {
    let mut parts = vec![job.hook.trim().to_string()];
    if let Some(first) = job.chapters_content.get(1) {
        parts.push(strip_chapter_heading(first));
    }
    join(parts)
}

pub fn rest_of_script(job: &Job) -> String {
    join(chapter_bodies(job, 2))
}

/// Assembles `part`, failing when it would be empty.
pub fn export(job: &Job, part: ExportPart) -> Result<String, ExportError> {
    let text = match part {
        ExportPart::Full => full_script(job),
        ExportPart::HookAndFirstChapter => hook_and_first_chapter(job),
        ExportPart::Rest => rest_of_script(job),
    };
    if text.is_empty() {
        return Err(ExportError::NothingToExport {
            job_id: job.id.clone(),
            part,
        });
    }
    Ok(text)
}

fn chapter_bodies(job: &Job, from_id: usize) -> Vec<String> {
    job.chapters_content
        .iter()
        .skip(from_id)
        .filter(|c| !c.trim().is_empty())
        .map(|c| strip_chapter_heading(c))
        .collect()
}

fn join(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
