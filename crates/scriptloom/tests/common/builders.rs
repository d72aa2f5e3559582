//! Canned model responses.

#![allow(dead_code)]

use scriptloom::pipeline::CHAPTER_DELIMITER;

/// Outline with a hook placeholder and `chapters` valid chapters of 400 words.
pub fn outline_text(title: &str, chapters: u32) -> String {
    let mut text = format!(
        "---\nTitle: {}\n\nChapter 0: The Hook\n(Hook to be written later.)\n",
        title
    );
    for id in 1..=chapters {
        text.push_str(&format!(
            "\nChapter {id}: Part {id}\n(Word Count: 400 words)\nConcept: Things happen in part {id}.\n"
        ));
    }
    text.push_str("---");
    text
}

/// Outline whose chapter 2 lacks its word-count line.
pub fn outline_with_broken_chapter_two() -> String {
    "Title: The Broken Outline

Chapter 0: The Hook
(Hook to be written later.)

Chapter 1: The Start
(Word Count: 450 words)
Concept: The hero arrives.

Chapter 2: The Middle
Concept: This block has no word count.

Chapter 3: The End
(Word Count: 600 words)
Concept: The villain falls."
        .to_string()
}

/// Joins chapter bodies the way the model is asked to.
pub fn batch_response(pieces: &[&str]) -> String {
    pieces.join(&format!("\n\n{}\n\n", CHAPTER_DELIMITER))
}
