//! The remote call seam.

use async_trait::async_trait;
use secrecy::SecretString;

use super::error::CallError;

/// Aspect ratio used for thumbnails.
pub const THUMBNAIL_ASPECT_RATIO: &str = "16:9";

/// What a single remote call should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GenerateText { prompt: String },
    GenerateImage { prompt: String, aspect_ratio: String },
}

impl Operation {
    pub fn text(prompt: impl Into<String>) -> Self {
        Operation::GenerateText {
            prompt: prompt.into(),
        }
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Operation::GenerateImage {
            prompt: prompt.into(),
            aspect_ratio: THUMBNAIL_ASPECT_RATIO.to_string(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::GenerateText { .. } => "text",
            Operation::GenerateImage { .. } => "image",
        }
    }
}

/// Successful result of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Image { mime_type: String, bytes: Vec<u8> },
}

/// Performs exactly one network round trip with one credential.
///
/// Implementations must inspect the response eagerly: blocked or empty
/// answers are errors here, never empty successes.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn invoke(
        &self,
        credential: &SecretString,
        operation: &Operation,
    ) -> Result<Payload, CallError>;
}
