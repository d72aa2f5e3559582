use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{info_span, Instrument};

use crate::broadcast::{JobPhase, JobProgressBroadcaster};
use crate::config::QueueConfig;
use crate::credentials::{CredentialError, CredentialRotator};
use crate::db::DatabaseError;
use crate::job::{Job, JobSource, JobStatus, JobStore, LibraryStatus};
use crate::pipeline::{
    GenerationRequest, PipelineError, RecordProgress, RunControl, ScriptGenerator, StoreProgress,
};

use super::status::AutomationStatus;

pub use crate::pipeline::runner::TASK_PAUSED;

pub const TASK_COMPLETED: &str = "Completed!";
pub const TASK_FAILED: &str = "Error!";
pub const TASK_STOPPED: &str = "Stopped";

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("No API keys configured")]
    NoCredentials,

    #[error("No pending or failed automation jobs to run")]
    NothingToRun,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Busy: {0}")]
    Busy(&'static str),

    #[error("No async runtime available to drive the queue")]
    NoRuntime,

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("Invalid job: {0}")]
    InvalidJob(&'static str),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential error: {0}")]
    Credential(CredentialError),
}

impl From<CredentialError> for QueueError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NoCredentials => QueueError::NoCredentials,
            other => QueueError::Credential(other),
        }
    }
}

/// Drives the automation queue and the manual single-run flow.
///
/// Cloning is cheap; all clones control the same queue. At most one loop
/// task exists at any time and at most one pipeline run is in flight.
#[derive(Clone)]
pub struct QueueController {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<JobStore>,
    generator: Arc<dyn ScriptGenerator>,
    credentials: CredentialRotator,
    config: QueueConfig,
    broadcaster: JobProgressBroadcaster,
    status: watch::Sender<AutomationStatus>,
    loop_active: watch::Sender<bool>,
    control: RunControl,
    manual_control: RunControl,
    pipeline_slot: Mutex<()>,
    /// Jobs already tried since the queue last left `IDLE`. A pause that
    /// ends the loop keeps them; a user retry removes its job.
    attempted: std::sync::Mutex<HashSet<String>>,
    /// Runtime the controller was built on, used when a control call comes
    /// from a thread outside it.
    runtime: Option<Handle>,
}

impl QueueController {
    pub fn new(
        store: Arc<JobStore>,
        generator: Arc<dyn ScriptGenerator>,
        credentials: CredentialRotator,
        config: QueueConfig,
        broadcaster: JobProgressBroadcaster,
    ) -> Self {
        let (status, _) = watch::channel(AutomationStatus::Idle);
        let (loop_active, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                store,
                generator,
                credentials,
                config,
                broadcaster,
                status,
                loop_active,
                control: RunControl::new(),
                manual_control: RunControl::new(),
                pipeline_slot: Mutex::new(()),
                attempted: std::sync::Mutex::new(HashSet::new()),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.inner.store
    }

    pub fn broadcaster(&self) -> &JobProgressBroadcaster {
        &self.inner.broadcaster
    }

    pub fn status(&self) -> AutomationStatus {
        self.inner.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AutomationStatus> {
        self.inner.status.subscribe()
    }

    /// Stop handle for [`Self::generate_manual`]. Queue controls never touch it.
    pub fn manual_control(&self) -> RunControl {
        self.inner.manual_control.clone()
    }

    /// Appends a `PENDING` automation job to the end of the queue.
    pub fn enqueue(
        &self,
        title: &str,
        concept: &str,
        duration_minutes: u32,
    ) -> Result<Job, QueueError> {
        let job = new_job(JobSource::Automation, title, concept, duration_minutes)?;
        let job = self.inner.store.insert(job)?;
        log::info!("Queued job {} '{}'", job.id, job.title);
        self.inner.broadcaster.emit(&job, JobPhase::Queued);
        Ok(job)
    }

    /// Starts the queue from `IDLE` or resumes it from `PAUSED`. May be
    /// called from any thread.
    pub fn run(&self) -> Result<(), QueueError> {
        let inner = &self.inner;
        if !inner.credentials.has_credentials()? {
            return Err(QueueError::NoCredentials);
        }
        let runtime = Handle::try_current()
            .ok()
            .or_else(|| inner.runtime.clone())
            .ok_or(QueueError::NoRuntime)?;

        match inner.status() {
            AutomationStatus::Running => {}
            AutomationStatus::Paused => {
                inner.control.resume();
                inner.status.send_replace(AutomationStatus::Running);
                log::info!("Automation resumed");
            }
            AutomationStatus::Idle => {
                if *inner.loop_active.borrow() {
                    return Err(QueueError::Busy("the previous run is still stopping"));
                }
                if !inner.store.has_eligible_automation() {
                    return Err(QueueError::NothingToRun);
                }
                inner.control.reset();
                inner.attempted().clear();
                inner.status.send_replace(AutomationStatus::Running);
                log::info!("Automation started");
            }
        }

        self.ensure_loop(&runtime);
        Ok(())
    }

    pub fn pause(&self) -> Result<(), QueueError> {
        match self.status() {
            AutomationStatus::Running => {
                self.inner.control.pause();
                self.inner.status.send_replace(AutomationStatus::Paused);
                log::info!("Automation paused");
                Ok(())
            }
            AutomationStatus::Paused => Ok(()),
            AutomationStatus::Idle => Err(QueueError::InvalidTransition {
                action: "pause",
                state: AutomationStatus::Idle.to_string(),
            }),
        }
    }

    pub fn resume(&self) -> Result<(), QueueError> {
        let status = self.status();
        if status != AutomationStatus::Paused {
            return Err(QueueError::InvalidTransition {
                action: "resume",
                state: status.to_string(),
            });
        }
        self.run()
    }

    /// Returns to `IDLE` and fails every running job with a stop error. The
    /// in-flight remote call, if any, finishes before the loop notices.
    pub fn stop(&self) {
        let inner = &self.inner;
        inner.status.send_replace(AutomationStatus::Idle);
        inner.control.stop();

        for id in inner.store.running_ids() {
            let updated = inner.store.update(&id, |job| {
                job.status = JobStatus::Failed;
                job.error = Some(PipelineError::StoppedByUser.to_string());
                job.current_task = Some(TASK_STOPPED.to_string());
            });
            if let Some(job) = updated {
                inner.broadcaster.emit(&job, JobPhase::Failed);
            }
        }
        log::info!("Automation stopped");
    }

    /// Makes a failed or finished job `PENDING` again and clears its error.
    pub fn retry(&self, job_id: &str) -> Result<Job, QueueError> {
        let job = self.require(job_id)?;
        if job.status == JobStatus::Running {
            return Err(QueueError::InvalidTransition {
                action: "retry",
                state: job.status.to_string(),
            });
        }
        let job = self
            .inner
            .store
            .update(job_id, |job| {
                job.status = JobStatus::Pending;
                job.error = None;
                job.current_task = None;
            })
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
        // Eligible again for the run in progress, if any.
        self.inner.attempted().remove(job_id);
        self.inner.broadcaster.emit(&job, JobPhase::Queued);
        Ok(job)
    }

    pub fn delete(&self, job_id: &str) -> Result<(), QueueError> {
        if self.inner.store.remove(job_id)? {
            log::info!("Deleted job {}", job_id);
            Ok(())
        } else {
            Err(QueueError::JobNotFound(job_id.to_string()))
        }
    }

    /// Flips a finished script between `AVAILABLE` and `ARCHIVED`.
    pub fn toggle_archive(&self, job_id: &str) -> Result<Job, QueueError> {
        let job = self.require(job_id)?;
        if job.status != JobStatus::Done {
            return Err(QueueError::InvalidTransition {
                action: "archive",
                state: job.status.to_string(),
            });
        }
        self.inner
            .store
            .update(job_id, |job| {
                job.library_status = match job.library_status {
                    Some(LibraryStatus::Archived) => Some(LibraryStatus::Available),
                    _ => Some(LibraryStatus::Archived),
                };
            })
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))
    }

    /// Runs one generation outside the queue. The job is stored, as `DONE`,
    /// only when generation succeeds.
    pub async fn generate_manual(
        &self,
        title: &str,
        concept: &str,
        duration_minutes: u32,
    ) -> Result<Job, QueueError> {
        let inner = &self.inner;
        if !inner.credentials.has_credentials()? {
            return Err(QueueError::NoCredentials);
        }
        let job = new_job(JobSource::Manual, title, concept, duration_minutes)?;
        let _slot = inner
            .pipeline_slot
            .try_lock()
            .map_err(|_| QueueError::Busy("another script is being generated"))?;

        inner.manual_control.reset();
        let request = GenerationRequest::from_job(&job);
        let span = info_span!("manual_job", job_id = %job.id);
        let progress = RecordProgress::new(job, Some(inner.broadcaster.clone()));

        let result = inner
            .generator
            .generate(&request, &inner.manual_control, &progress)
            .instrument(span)
            .await;

        let mut job = progress.into_job();
        match result {
            Ok(_) => {
                job.status = JobStatus::Done;
                job.library_status = Some(LibraryStatus::Available);
                job.current_task = Some(TASK_COMPLETED.to_string());
                let job = inner.store.insert(job)?;
                log::info!("Manual script '{}' complete", job.display_title());
                inner.broadcaster.emit(&job, JobPhase::Completed);
                Ok(job)
            }
            Err(err) => {
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                inner.broadcaster.emit(&job, JobPhase::Failed);
                Err(err.into())
            }
        }
    }

    /// Resolves once no loop task is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.loop_active.subscribe();
        // The sender lives as long as `inner`, so this cannot fail.
        let _ = rx.wait_for(|active| !*active).await;
    }

    fn require(&self, job_id: &str) -> Result<Job, QueueError> {
        self.inner
            .store
            .get(job_id)
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))
    }

    fn ensure_loop(&self, runtime: &Handle) {
        let started = self.inner.loop_active.send_if_modified(|active| {
            if *active {
                false
            } else {
                *active = true;
                true
            }
        });
        if started {
            // The guard travels with the task, so the flag clears even if the
            // runtime drops the task without polling it.
            let guard = LoopGuard(Arc::clone(&self.inner));
            runtime.spawn(Arc::clone(&self.inner).run_loop(guard));
        }
    }
}

fn new_job(
    source: JobSource,
    title: &str,
    concept: &str,
    duration_minutes: u32,
) -> Result<Job, QueueError> {
    let title = title.trim();
    let concept = concept.trim();
    if title.is_empty() {
        return Err(QueueError::InvalidJob("title is empty"));
    }
    if concept.is_empty() {
        return Err(QueueError::InvalidJob("concept is empty"));
    }
    if duration_minutes == 0 {
        return Err(QueueError::InvalidJob("duration must be at least one minute"));
    }
    Ok(Job::new(source, title, concept, duration_minutes))
}

/// Clears the loop flag however the loop task ends.
struct LoopGuard(Arc<Inner>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.loop_active.send_replace(false);
    }
}

impl Inner {
    fn status(&self) -> AutomationStatus {
        *self.status.borrow()
    }

    fn attempted(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.attempted.lock().unwrap_or_else(|poisoned| {
            log::warn!("Attempted-jobs lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Next eligible automation job not yet tried in this run. A failing job
    /// is never retried automatically.
    fn next_unattempted(&self) -> Option<Job> {
        let attempted = self.attempted();
        self.store.next_eligible_automation_except(&attempted)
    }

    async fn run_loop(self: Arc<Self>, _guard: LoopGuard) {
        log::info!("Automation loop started");

        loop {
            if self.status() == AutomationStatus::Idle {
                break;
            }
            let Some(job) = self.next_unattempted() else {
                log::info!("Queue drained, automation is idle");
                self.status.send_replace(AutomationStatus::Idle);
                break;
            };

            if !self.hold_while_paused(&job.id).await {
                break;
            }

            // A manual run may hold the slot for a while. Whatever the user
            // did meanwhile is re-read before the job is touched.
            let slot = self.pipeline_slot.lock().await;
            if self.status() != AutomationStatus::Running {
                log::debug!("Queue left RUNNING while waiting to start {}", job.id);
                continue;
            }

            self.attempted().insert(job.id.clone());
            let span = info_span!("queue_job", job_id = %job.id);
            let succeeded = self.process(&job, slot).instrument(span).await;

            if succeeded && self.next_unattempted().is_some() && !self.cooldown(&job.id).await {
                break;
            }
        }
        log::info!("Automation loop exited");
    }

    /// Waits while the queue is paused. Returns false once stopped.
    async fn hold_while_paused(&self, job_id: &str) -> bool {
        let mut announced = false;
        while self.status() == AutomationStatus::Paused {
            if !announced {
                if let Some(job) = self.store.update(job_id, |job| {
                    job.current_task = Some(TASK_PAUSED.to_string());
                }) {
                    self.broadcaster.emit(&job, JobPhase::Paused);
                }
                announced = true;
            }
            tokio::time::sleep(self.config.pause_poll()).await;
        }
        self.status() != AutomationStatus::Idle
    }

    /// Runs the pipeline for one job while holding the pipeline slot.
    /// Returns true when the job is `DONE`.
    async fn process(&self, job: &Job, _slot: MutexGuard<'_, ()>) -> bool {
        let Some(job) = self.store.update(&job.id, |job| {
            job.status = JobStatus::Running;
            job.error = None;
        }) else {
            log::debug!("Job {} was deleted before it started", job.id);
            return false;
        };
        self.broadcaster.emit(&job, JobPhase::Generating);
        log::info!("Generating '{}' ({})", job.title, job.id);

        let progress = StoreProgress::new(
            Arc::clone(&self.store),
            &job.id,
            Some(self.broadcaster.clone()),
        );
        let mut result = self
            .generator
            .generate(&GenerationRequest::from_job(&job), &self.control, &progress)
            .await;
        // A stop that lands after the last checkpoint still wins.
        if result.is_ok() && self.control.is_stopped() {
            result = Err(PipelineError::StoppedByUser);
        }

        match result {
            Ok(report) => {
                let done = self.store.update(&job.id, |job| {
                    job.status = JobStatus::Done;
                    job.library_status = Some(LibraryStatus::Available);
                    job.error = None;
                    job.current_task = Some(TASK_COMPLETED.to_string());
                });
                if let Some(done) = done {
                    log::info!(
                        "Finished '{}': {} of {} words, {} warnings",
                        done.display_title(),
                        done.words_written,
                        done.total_words,
                        report.warnings.len()
                    );
                    self.broadcaster.emit(&done, JobPhase::Completed);
                }
                true
            }
            Err(err) => {
                let stopped = err.is_stop();
                let message = err.to_string();
                if stopped {
                    log::info!("Job {} stopped", job.id);
                } else {
                    log::warn!("Job {} failed: {}", job.id, message);
                }
                let failed = self.store.update(&job.id, |job| {
                    job.status = JobStatus::Failed;
                    job.error = Some(message);
                    job.current_task = Some(
                        if stopped { TASK_STOPPED } else { TASK_FAILED }.to_string(),
                    );
                });
                if let Some(failed) = failed {
                    self.broadcaster.emit(&failed, JobPhase::Failed);
                }
                false
            }
        }
    }

    /// Counts down once per second. Returns false when the queue left
    /// `RUNNING` before or during the countdown.
    async fn cooldown(&self, job_id: &str) -> bool {
        for remaining in (1..=self.config.cooldown_secs).rev() {
            if self.status() != AutomationStatus::Running {
                break;
            }
            if let Some(job) = self.store.update(job_id, |job| {
                job.current_task = Some(format!("Cooldown: Next job in {}s...", remaining));
            }) {
                self.broadcaster.emit(&job, JobPhase::Cooldown);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.store.update(job_id, |job| {
            job.current_task = Some(TASK_COMPLETED.to_string());
        });
        self.status() == AutomationStatus::Running
    }
}
