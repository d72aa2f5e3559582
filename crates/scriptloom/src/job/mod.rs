//! Job data model, merge updates, and the persistent job store.

pub mod model;
pub mod store;
pub mod update;

pub use model::{
    count_words, ChapterOutline, Job, JobSource, JobStatus, LibraryStatus, HOOK_WORD_ALLOWANCE,
    MAX_CHAPTER_ID,
};
pub use store::{JobCounts, JobStore};
pub use update::{JobPatch, JobUpdate};
