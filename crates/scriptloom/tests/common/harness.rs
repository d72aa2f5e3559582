//! Test harness wiring a queue controller over scripted collaborators.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use scriptloom::config::{PipelineConfig, QueueConfig};
use scriptloom::credentials::{CredentialRotator, MemoryCursor, StaticCredentials};
use scriptloom::driver::TextGenerator;
use scriptloom::job::{Job, JobSource, JobStatus};
use scriptloom::pipeline::{GenerationPipeline, ScriptGenerator};
use scriptloom::{Database, JobProgressBroadcaster, JobStore, QueueController};

pub struct TestHarness {
    pub store: Arc<JobStore>,
    pub queue: QueueController,
}

impl TestHarness {
    /// Queue over an in-memory store with one API key.
    pub fn with_generator(generator: Arc<dyn ScriptGenerator>, config: QueueConfig) -> Self {
        let store = Arc::new(JobStore::new());
        let queue = QueueController::new(
            Arc::clone(&store),
            generator,
            one_key(),
            config,
            JobProgressBroadcaster::default(),
        );
        Self { store, queue }
    }

    /// Queue running the real pipeline over a scripted text generator.
    pub fn with_pipeline(text: Arc<dyn TextGenerator>, config: QueueConfig) -> Self {
        let pipeline = Arc::new(GenerationPipeline::new(text, PipelineConfig::default()));
        Self::with_generator(pipeline, config)
    }

    /// Fresh temp dir for on-disk databases. Keep the `TempDir` alive for
    /// as long as the path is used.
    pub fn temp_db_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("data").join("scriptloom.db");
        (dir, path)
    }

    pub fn open_db(path: &PathBuf) -> Database {
        Database::open(path).expect("Failed to open database")
    }

    /// Inserts an automation job with the given status.
    pub fn add_job(&self, title: &str, status: JobStatus) -> Job {
        let mut job = Job::new(JobSource::Automation, title, "A concept.", 10);
        job.status = status;
        self.store.insert(job).expect("insert job")
    }

    pub fn job(&self, id: &str) -> Job {
        self.store.get(id).expect("job exists")
    }
}

pub fn one_key() -> CredentialRotator {
    CredentialRotator::new(
        Arc::new(StaticCredentials::new(["key-alpha-0001"])),
        Arc::new(MemoryCursor::default()),
    )
}

pub fn queue_config(cooldown_secs: u64) -> QueueConfig {
    QueueConfig {
        cooldown_secs,
        pause_poll_ms: 1000,
    }
}
