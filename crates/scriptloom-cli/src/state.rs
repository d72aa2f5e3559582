//! Wiring of the library components from a loaded configuration.

use std::sync::Arc;

use scriptloom::config::Config;
use scriptloom::credentials::{CredentialRotator, CredentialStore, SettingsCursor};
use scriptloom::pipeline::GenerationPipeline;
use scriptloom::secrets::CREDENTIAL_KEY_ENV_VAR;
use scriptloom::{
    CredentialCipher, Database, GeminiClient, JobProgressBroadcaster, JobStore, QueueController,
    RateGate, RotationDriver,
};

use crate::error::CliError;

pub struct AppState {
    pub db: Database,
    pub credentials: Arc<CredentialStore>,
    pub driver: Arc<RotationDriver>,
    pub queue: QueueController,
}

impl AppState {
    pub fn open(config: &Config) -> Result<Self, CliError> {
        let db_path = config.resolved_database_path().ok_or_else(|| {
            CliError::Invalid("cannot determine a database path; set database_path".to_string())
        })?;
        let db = Database::open(&db_path)?;

        let credentials = Arc::new(match CredentialCipher::from_env()? {
            Some(cipher) => {
                log::debug!("Stored API keys are encrypted with {}", CREDENTIAL_KEY_ENV_VAR);
                CredentialStore::with_cipher(db.clone(), cipher)
            }
            None => CredentialStore::new(db.clone()),
        });
        let rotator = CredentialRotator::new(
            credentials.clone(),
            Arc::new(SettingsCursor::new(db.clone())),
        );

        let remote = Arc::new(GeminiClient::new(&config.api)?);
        let gate = Arc::new(RateGate::new(config.rate_limit.min_call_spacing()));
        let driver = Arc::new(RotationDriver::new(remote, rotator.clone(), gate));

        let pipeline = Arc::new(GenerationPipeline::new(
            driver.clone(),
            config.pipeline.clone(),
        ));
        let store = Arc::new(JobStore::load(db.clone())?);
        let queue = QueueController::new(
            store,
            pipeline,
            rotator,
            config.queue.clone(),
            JobProgressBroadcaster::default(),
        );

        Ok(Self {
            db,
            credentials,
            driver,
            queue,
        })
    }
}
