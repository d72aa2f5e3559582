use std::sync::{Arc, Mutex};

use crate::broadcast::{JobPhase, JobProgressBroadcaster};
use crate::job::{Job, JobStore, JobUpdate};

/// Receives every incremental update the pipeline emits, in stage order.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: JobUpdate);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _update: JobUpdate) {}
}

/// Merges updates into a job held by the [`JobStore`], keyed by job id.
/// Used by the automation queue.
pub struct StoreProgress {
    store: Arc<JobStore>,
    job_id: String,
    broadcaster: Option<JobProgressBroadcaster>,
}

impl StoreProgress {
    pub fn new(
        store: Arc<JobStore>,
        job_id: impl Into<String>,
        broadcaster: Option<JobProgressBroadcaster>,
    ) -> Self {
        Self {
            store,
            job_id: job_id.into(),
            broadcaster,
        }
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, update: JobUpdate) {
        match self.store.apply(&self.job_id, &update) {
            Some(job) => {
                if let Some(broadcaster) = &self.broadcaster {
                    broadcaster.emit(&job, JobPhase::Generating);
                }
            }
            // Deleted while running; the run finishes without a record.
            None => log::debug!("Progress for unknown job {} dropped", self.job_id),
        }
    }
}

/// Merges updates into a detached job record. Used by the manual flow, which
/// only stores its job once generation succeeded.
pub struct RecordProgress {
    job: Mutex<Job>,
    broadcaster: Option<JobProgressBroadcaster>,
}

impl RecordProgress {
    pub fn new(job: Job, broadcaster: Option<JobProgressBroadcaster>) -> Self {
        Self {
            job: Mutex::new(job),
            broadcaster,
        }
    }

    pub fn snapshot(&self) -> Job {
        self.lock().clone()
    }

    pub fn into_job(self) -> Job {
        self.job.into_inner().unwrap_or_else(|poisoned| {
            log::warn!("Manual job record lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Job> {
        self.job.lock().unwrap_or_else(|poisoned| {
            log::warn!("Manual job record lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl ProgressReporter for RecordProgress {
    fn report(&self, update: JobUpdate) {
        let mut job = self.lock();
        update.apply_to(&mut job);
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.emit(&job, JobPhase::Generating);
        }
    }
}
