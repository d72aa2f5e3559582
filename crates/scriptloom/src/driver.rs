//! Retry/rotation driver.
//!
//! One logical call tries every credential at most once, starting from the
//! last known-good one, and gives up with the last error once all of them
//! have failed. This is the only place where remote failures are absorbed.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::credentials::{CredentialError, CredentialRotator};
use crate::rate_gate::RateGate;
use crate::remote::{CallError, Operation, Payload, RemoteCall};
use crate::secrets::mask_secret;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No API keys configured. Add at least one key first.")]
    NoCredentials,

    #[error("All API keys failed. Last error: {last_error}")]
    AllCredentialsExhausted { attempts: usize, last_error: String },

    #[error("Remote returned {actual} where {expected} was expected")]
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Credential error: {0}")]
    Credential(CredentialError),
}

impl From<CredentialError> for DriverError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NoCredentials => DriverError::NoCredentials,
            other => DriverError::Credential(other),
        }
    }
}

/// Text generation as seen by the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, DriverError>;
}

/// A generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct RotationDriver {
    remote: Arc<dyn RemoteCall>,
    rotator: CredentialRotator,
    gate: Arc<RateGate>,
}

impl RotationDriver {
    pub fn new(remote: Arc<dyn RemoteCall>, rotator: CredentialRotator, gate: Arc<RateGate>) -> Self {
        Self {
            remote,
            rotator,
            gate,
        }
    }

    pub fn rotator(&self) -> &CredentialRotator {
        &self.rotator
    }

    /// Performs one logical call.
    pub async fn call(&self, operation: &Operation) -> Result<Payload, DriverError> {
        let credentials = self.rotator.snapshot()?;
        let count = credentials.len();

        self.gate.await_turn().await;

        let mut index = self.rotator.select_start_index(count)?;
        let mut last_error: Option<CallError> = None;

        for attempt in 1..=count {
            let credential = &credentials[index];
            match self.remote.invoke(credential, operation).await {
                Ok(payload) => {
                    self.rotator.record_success(index);
                    log::debug!(
                        "{} call succeeded with key #{} on attempt {}",
                        operation.kind(),
                        index,
                        attempt
                    );
                    return Ok(payload);
                }
                Err(e) => {
                    log::warn!(
                        "API key #{} ({}) failed: {}",
                        index,
                        mask_secret(credential.expose_secret()),
                        e
                    );
                    if let Some(wait) = e.retry_after() {
                        self.gate.await_cooldown(wait).await;
                    }
                    last_error = Some(e);
                    index = self.rotator.advance(index, count)?;
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        log::error!("All {} API key(s) failed: {}", count, last_error);
        Err(DriverError::AllCredentialsExhausted {
            attempts: count,
            last_error,
        })
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, DriverError> {
        match self.call(&Operation::image(prompt)).await? {
            Payload::Image { mime_type, bytes } => Ok(GeneratedImage { mime_type, bytes }),
            Payload::Text(_) => Err(DriverError::UnexpectedPayload {
                expected: "image",
                actual: "text",
            }),
        }
    }
}

#[async_trait]
impl TextGenerator for RotationDriver {
    async fn generate_text(&self, prompt: &str) -> Result<String, DriverError> {
        match self.call(&Operation::text(prompt)).await? {
            Payload::Text(text) => Ok(text),
            Payload::Image { .. } => Err(DriverError::UnexpectedPayload {
                expected: "text",
                actual: "image",
            }),
        }
    }
}
