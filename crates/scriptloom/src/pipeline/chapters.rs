//! Chapter batching and splitting of multi-chapter responses.

use crate::job::ChapterOutline;

use super::error::{PipelineError, PipelineWarning};

/// Separator the batch prompt asks the model to put between chapters.
pub const CHAPTER_DELIMITER: &str = "---CHAPTER-BREAK---";

/// Groups the non-hook chapters into consecutive batches of `batch_size`,
/// in ascending id order. A zero size is treated as one.
pub fn plan_batches(outlines: &[ChapterOutline], batch_size: usize) -> Vec<Vec<ChapterOutline>> {
    let mut chapters: Vec<ChapterOutline> =
        outlines.iter().filter(|c| !c.is_hook()).cloned().collect();
    chapters.sort_by_key(|c| c.id);
    chapters
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Progress label shown while a batch is written.
pub fn batch_task_label(batch: &[ChapterOutline]) -> String {
    let ids: Vec<String> = batch.iter().map(|c| c.id.to_string()).collect();
    let noun = if ids.len() == 1 { "Chapter" } else { "Chapters" };
    format!("Writing {} {}...", noun, ids.join(", "))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSplit {
    /// `(chapter id, text)` in batch order. Pieces beyond the batch length
    /// are dropped and chapters without a piece are absent.
    pub pieces: Vec<(u32, String)>,
    pub warning: Option<PipelineWarning>,
}

/// Splits a batch response on [`CHAPTER_DELIMITER`] and pairs the trimmed
/// pieces with the batch's chapters by position.
pub fn split_batch_response(text: &str, batch: &[ChapterOutline]) -> BatchSplit {
    let raw: Vec<&str> = text.split(CHAPTER_DELIMITER).map(str::trim).collect();

    let pieces = batch
        .iter()
        .zip(raw.iter())
        .map(|(chapter, piece)| (chapter.id, piece.to_string()))
        .collect();

    let warning = (raw.len() != batch.len()).then(|| PipelineWarning::ChapterCountMismatch {
        chapter_ids: batch.iter().map(|c| c.id).collect(),
        requested: batch.len(),
        received: raw.len(),
    });

    BatchSplit { pieces, warning }
}

/// Like [`split_batch_response`] but rejects a piece count that differs
/// from the batch length.
pub fn split_batch_response_strict(
    text: &str,
    batch: &[ChapterOutline],
) -> Result<Vec<(u32, String)>, PipelineError> {
    let split = split_batch_response(text, batch);
    match split.warning {
        Some(PipelineWarning::ChapterCountMismatch {
            requested,
            received,
            ..
        }) => Err(PipelineError::ChapterCountMismatch {
            requested,
            received,
        }),
        None => Ok(split.pieces),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: u32) -> ChapterOutline {
        ChapterOutline {
            id,
            title: format!("Chapter {}", id),
            word_count: if id == 0 { 0 } else { 400 },
            concept: "c".to_string(),
        }
    }

    fn ids(batch: &[ChapterOutline]) -> Vec<u32> {
        batch.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_plan_batches_skips_hook_and_sorts() {
        let outlines: Vec<ChapterOutline> =
            [0, 3, 1, 2, 6, 5, 4, 7].into_iter().map(chapter).collect();
        let batches = plan_batches(&outlines, 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(ids(&batches[0]), vec![1, 2, 3]);
        assert_eq!(ids(&batches[1]), vec![4, 5, 6]);
        assert_eq!(ids(&batches[2]), vec![7]);
    }

    #[test]
    fn test_plan_batches_zero_size() {
        let outlines: Vec<ChapterOutline> = (1..=2).map(chapter).collect();
        assert_eq!(plan_batches(&outlines, 0).len(), 2);
    }

    #[test]
    fn test_batch_task_label() {
        let batch: Vec<ChapterOutline> = (1..=3).map(chapter).collect();
        assert_eq!(batch_task_label(&batch), "Writing Chapters 1, 2, 3...");
        assert_eq!(batch_task_label(&[chapter(7)]), "Writing Chapter 7...");
    }

    #[test]
    fn test_split_exact() {
        let batch: Vec<ChapterOutline> = (4..=6).map(chapter).collect();
        let text = format!(" four \n{d}\nfive\n{d}\nsix\n", d = CHAPTER_DELIMITER);
        let split = split_batch_response(&text, &batch);
        assert!(split.warning.is_none());
        assert_eq!(
            split.pieces,
            vec![
                (4, "four".to_string()),
                (5, "five".to_string()),
                (6, "six".to_string())
            ]
        );
    }

    #[test]
    fn test_split_fewer_pieces_pairs_by_position() {
        let batch: Vec<ChapterOutline> = (1..=3).map(chapter).collect();
        let text = format!("one{d}two", d = CHAPTER_DELIMITER);
        let split = split_batch_response(&text, &batch);
        assert_eq!(
            split.pieces,
            vec![(1, "one".to_string()), (2, "two".to_string())]
        );
        assert_eq!(
            split.warning,
            Some(PipelineWarning::ChapterCountMismatch {
                chapter_ids: vec![1, 2, 3],
                requested: 3,
                received: 2,
            })
        );
    }

    #[test]
    fn test_split_extra_pieces_are_dropped() {
        let batch = vec![chapter(1)];
        let text = format!("one{d}stray", d = CHAPTER_DELIMITER);
        let split = split_batch_response(&text, &batch);
        assert_eq!(split.pieces, vec![(1, "one".to_string())]);
        assert!(split.warning.is_some());
    }

    #[test]
    fn test_split_strict_rejects_mismatch() {
        let batch: Vec<ChapterOutline> = (1..=3).map(chapter).collect();
        let err = split_batch_response_strict("only one", &batch).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ChapterCountMismatch {
                requested: 3,
                received: 1
            }
        ));
    }
}
