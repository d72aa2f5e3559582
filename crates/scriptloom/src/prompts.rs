//! Prompt templates. Pure functions, no I/O.
//!
//! The outline prompt fixes the response layout that
//! [`crate::pipeline::outline::parse_outline`] reads back, and the batch
//! prompt fixes the delimiter that [`crate::pipeline::chapters`] splits on.

use crate::job::ChapterOutline;
use crate::pipeline::chapters::CHAPTER_DELIMITER;

/// Narration pace used to size a script.
pub const WORDS_PER_MINUTE: u32 = 150;

pub fn outline_prompt(title: &str, concept: &str, duration_minutes: u32) -> String {
    let total_words = duration_minutes * WORDS_PER_MINUTE;
    format!(
        r#"You are a story architect for long-form, first-person narrated videos. Turn the idea below into a chapter-by-chapter outline.

Use very simple, clear language in every title and concept. Reply with the outline only, no greetings or commentary.

Steps:
1. Sharpen the title so it names the villain's action and the hero's hidden edge. Keep it under 100 characters.
2. Budget the words. Narration runs at {wpm} words per minute, so a {duration}-minute video needs about {total} words in total. Chapter 1 gets 400 to 500 words and builds the emotional bond with the hero. The hook is written separately (about 150 words). Spread the rest over the remaining chapters as the pacing needs.
3. Write between 5 and 12 chapters, each with a title, a word count, and a short concept.

Use exactly this layout:
---
Title: [Refined title]

Chapter 0: The Hook
(Hook to be written later.)

Chapter 1: [Chapter title]
(Word Count: [number] words)
Concept: [Two or three simple sentences.]

Chapter 2: [Chapter title]
(Word Count: [number] words)
Concept: [Two or three simple sentences.]
---

Title:
{title}

Concept:
{concept}

Duration:
{duration} minutes
"#,
        wpm = WORDS_PER_MINUTE,
        duration = duration_minutes,
        total = total_words,
        title = title.trim(),
        concept = concept.trim(),
    )
}

pub fn hook_prompt(outline_text: &str) -> String {
    format!(
        r#"You write the opening hook for viral first-person revenge stories. Using the outline below, write one hook of 120 to 150 words.

Rules:
- Very simple English that a ten-year-old follows easily.
- Mix short and medium sentences so it reads naturally, never choppy.
- Open on the villain in the middle of their worst act, for example "This landlord thought she could evict a war hero...".
- Speak as the hero ("I", "me"), hint at the hero's hidden job or power, and promise the villain a heavy price.
- Close with a question to the viewer followed by "Let us know in the comments."

Story outline:
---
{outline}
---
"#,
        outline = outline_text.trim(),
    )
}

pub fn chapter_batch_prompt(outline_text: &str, chapters: &[ChapterOutline]) -> String {
    let requested: Vec<String> = chapters
        .iter()
        .map(|c| {
            format!(
                "- Chapter {}: {}\n  Word Count: about {} words\n  Concept: {}",
                c.id, c.title, c.word_count, c.concept
            )
        })
        .collect();

    format!(
        r#"Write the full narration for the chapters listed at the end, following the story outline.

Rules:
- Very simple English for a young reader, common words, short paragraphs.
- Mix short and medium sentences so the text flows.
- Do not repeat the chapter heading; start directly with the story text.
- After each chapter except the last, put the line {delimiter} on its own and then continue with the next chapter.

Story outline:
---
{outline}
---

Chapters to write, in order:
{requested}
"#,
        delimiter = CHAPTER_DELIMITER,
        outline = outline_text.trim(),
        requested = requested.join("\n\n"),
    )
}

/// Prompt for one thumbnail: the style's master prompt followed by the scene.
pub fn thumbnail_prompt(master_prompt: &str, scene: &str) -> String {
    format!(
        "{} The specific scene to create is: {}",
        master_prompt.trim(),
        scene.trim()
    )
}
