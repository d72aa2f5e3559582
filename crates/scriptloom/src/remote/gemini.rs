//! HTTP client for the Gemini `generateContent` and Imagen `predict` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::adapter::{Operation, Payload, RemoteCall};
use super::error::CallError;
use crate::config::ApiConfig;

/// Finish reasons that mean the answer was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    /// Reasoning parts are not part of the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

/// Pulls the answer text out of a `generateContent` body.
pub(crate) fn extract_text(body: &str) -> Result<String, CallError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| CallError::Malformed(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .filter(|r| !r.is_empty())
    {
        return Err(CallError::Blocked { reason });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(CallError::EmptyResponse)?;

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
    {
        return Err(CallError::Blocked {
            reason: reason.to_string(),
        });
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(CallError::EmptyResponse);
    }
    Ok(text)
}

/// Pulls the first image out of a `predict` body.
pub(crate) fn extract_image(body: &str) -> Result<Payload, CallError> {
    let response: PredictResponse =
        serde_json::from_str(body).map_err(|e| CallError::Malformed(e.to_string()))?;

    let mut filtered = None;
    for prediction in response.predictions {
        if let Some(encoded) = prediction.bytes_base64_encoded {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| CallError::Malformed(format!("Invalid image data: {}", e)))?;
            return Ok(Payload::Image {
                mime_type: prediction
                    .mime_type
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                bytes,
            });
        }
        if filtered.is_none() {
            filtered = prediction.rai_filtered_reason;
        }
    }

    match filtered {
        Some(reason) => Err(CallError::Blocked { reason }),
        None => Err(CallError::EmptyResponse),
    }
}

/// Remote adapter speaking the Generative Language REST API.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    /// Builds a client with the configured connect and request timeouts.
    pub fn new(api: &ApiConfig) -> Result<Self, CallError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()
            .map_err(|e| CallError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            text_model: api.text_model.clone(),
            image_model: api.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post(
        &self,
        credential: &SecretString,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<String, CallError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", credential.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CallError::from_http(status.as_u16(), &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl RemoteCall for GeminiClient {
    async fn invoke(
        &self,
        credential: &SecretString,
        operation: &Operation,
    ) -> Result<Payload, CallError> {
        match operation {
            Operation::GenerateText { prompt } => {
                let url = self.endpoint(&self.text_model, "generateContent");
                let body = json!({
                    "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
                });
                log::debug!("POST {} ({} prompt chars)", url, prompt.len());
                let raw = self.post(credential, &url, &body).await?;
                extract_text(&raw).map(Payload::Text)
            }
            Operation::GenerateImage {
                prompt,
                aspect_ratio,
            } => {
                let url = self.endpoint(&self.image_model, "predict");
                let body = json!({
                    "instances": [{ "prompt": prompt }],
                    "parameters": {
                        "sampleCount": 1,
                        "aspectRatio": aspect_ratio,
                        "outputOptions": { "mimeType": DEFAULT_IMAGE_MIME }
                    }
                });
                log::debug!("POST {} (aspect {})", url, aspect_ratio);
                let raw = self.post(credential, &url, &body).await?;
                extract_image(&raw)
            }
        }
    }
}
