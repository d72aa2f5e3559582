use thiserror::Error;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to generate a valid outline.")]
    EmptyOutline,

    #[error("Stopped by user.")]
    StoppedByUser,

    #[error("{0}")]
    Driver(#[from] DriverError),

    #[error("Chapter batch returned {received} pieces, expected {requested}")]
    ChapterCountMismatch { requested: usize, received: usize },
}

impl PipelineError {
    pub fn is_stop(&self) -> bool {
        matches!(self, PipelineError::StoppedByUser)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// A batch response split into a different number of pieces than the
    /// number of chapters requested. Pieces were paired by position.
    ChapterCountMismatch {
        chapter_ids: Vec<u32>,
        requested: usize,
        received: usize,
    },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::ChapterCountMismatch {
                chapter_ids,
                requested,
                received,
            } => write!(
                f,
                "chapters {:?}: expected {} pieces, received {}",
                chapter_ids, requested, received
            ),
        }
    }
}
