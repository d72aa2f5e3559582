//! Script generation: outline, hook, then chapters in sequential batches.

pub mod chapters;
pub mod context;
pub mod control;
pub mod error;
pub mod outline;
pub mod progress;
pub mod runner;

pub use chapters::{plan_batches, split_batch_response, BatchSplit, CHAPTER_DELIMITER};
pub use context::{GenerationReport, GenerationRequest};
pub use control::RunControl;
pub use error::{PipelineError, PipelineWarning};
pub use outline::{parse_outline, ParsedOutline};
pub use progress::{NoopProgress, ProgressReporter, RecordProgress, StoreProgress};
pub use runner::{GenerationPipeline, ScriptGenerator};
