//! Cooperative pause and stop signals shared between a controller and the
//! pipeline run it drives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::PipelineError;

/// Cloneable handle; every clone observes the same flags.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Requests a stop and clears any pause so a waiting run can observe it.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Clears both flags before a new run.
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Returns `StoppedByUser` once a stop was requested.
    pub fn checkpoint(&self) -> Result<(), PipelineError> {
        if self.is_stopped() {
            Err(PipelineError::StoppedByUser)
        } else {
            Ok(())
        }
    }

    /// Polls until the pause flag clears or a stop is requested.
    pub async fn wait_while_paused(&self, poll: Duration) {
        while self.is_paused() && !self.is_stopped() {
            tokio::time::sleep(poll).await;
        }
    }
}
