//! The automation queue: a single background loop that drains eligible
//! automation jobs one at a time.

pub mod controller;
pub mod status;

pub use controller::{QueueController, QueueError, TASK_COMPLETED, TASK_PAUSED, TASK_STOPPED};
pub use status::AutomationStatus;
