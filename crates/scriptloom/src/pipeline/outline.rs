//! Reads the structured outline text back into chapter records.
//!
//! The layout is fixed by [`crate::prompts::outline_prompt`]:
//!
//! ```text
//! Title: Refined title
//!
//! Chapter 0: The Hook
//! (Hook to be written later.)
//!
//! Chapter 1: Chapter title
//! (Word Count: 450 words)
//! Concept: Two or three sentences.
//! ```
//!
//! Parsing is lenient. Chapter blocks missing a title, word count or concept
//! are skipped instead of failing the whole outline.

use std::sync::LazyLock;

use regex::Regex;

use crate::job::{ChapterOutline, MAX_CHAPTER_ID};

use super::error::PipelineError;

pub const DEFAULT_TITLE: &str = "Untitled Story";
pub const HOOK_TITLE: &str = "The Hook";

static RE_CHAPTER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Chapter (\d+):[ \t]*(.*)$").unwrap());
static RE_WORD_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(Word Count: (\d+) words?\)$").unwrap());
static RE_CONCEPT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Concept:([\s\S]*)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutline {
    pub refined_title: String,
    pub chapters: Vec<ChapterOutline>,
}

/// Parses an outline. Fails with [`PipelineError::EmptyOutline`] when no
/// chapter with id 1 or greater survives.
pub fn parse_outline(text: &str) -> Result<ParsedOutline, PipelineError> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
        .collect();

    let refined_title = lines
        .iter()
        .map(|line| line.trim_start())
        .find(|line| {
            line.get(..6)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("title:"))
        })
        .map(|line| line[6..].trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let chapters: Vec<ChapterOutline> = split_blocks(&lines)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect();

    if !chapters.iter().any(|c| !c.is_hook()) {
        return Err(PipelineError::EmptyOutline);
    }

    Ok(ParsedOutline {
        refined_title,
        chapters,
    })
}

/// Groups lines into blocks that each start at a chapter header. Lines before
/// the first header are dropped.
fn split_blocks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in lines {
        let line = line.trim_start();
        if RE_CHAPTER_HEADER.is_match(line) {
            blocks.push(vec![line]);
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
}

fn parse_block(block: &[&str]) -> Option<ChapterOutline> {
    let header = RE_CHAPTER_HEADER.captures(block.first()?)?;
    let Ok(id) = header[1].parse::<u32>() else {
        log::debug!("Skipping chapter with unreadable id '{}'", &header[1]);
        return None;
    };
    if id > MAX_CHAPTER_ID {
        log::debug!("Skipping chapter {} above the id limit", id);
        return None;
    }

    if id == 0 {
        return Some(ChapterOutline {
            id,
            title: HOOK_TITLE.to_string(),
            word_count: 0,
            concept: block[1..].join("\n").trim().to_string(),
        });
    }

    let title = header[2].trim();
    if title.is_empty() {
        log::debug!("Skipping chapter {} without a title", id);
        return None;
    }

    let word_count = block[1..].iter().find_map(|line| {
        RE_WORD_COUNT
            .captures(line.trim())
            .and_then(|caps| caps[1].parse::<u32>().ok())
    });
    let Some(word_count) = word_count else {
        log::debug!("Skipping chapter {} without a word count", id);
        return None;
    };

    let body = block[1..].join("\n");
    let concept = RE_CONCEPT
        .captures(&body)
        .and_then(|caps| caps[1].trim().lines().next().map(|l| l.trim().to_string()))
        .filter(|concept| !concept.is_empty());
    let Some(concept) = concept else {
        log::debug!("Skipping chapter {} without a concept", id);
        return None;
    };

    Some(ChapterOutline {
        id,
        title: title.to_string(),
        word_count,
        concept,
    })
}
