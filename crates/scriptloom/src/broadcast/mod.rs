//! Broadcasting of job progress for real-time consumers such as the CLI's
//! `run --follow` view.

pub mod job_progress;

pub use job_progress::{JobPhase, JobProgressBroadcaster, JobProgressEvent};
