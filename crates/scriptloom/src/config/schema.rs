use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Overrides `~/.scriptloom/data/scriptloom.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: None,
            api: ApiConfig::default(),
            rate_limit: RateLimitConfig::default(),
            pipeline: PipelineConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl Config {
    /// Configured database path, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Upper bound on one remote call, so a hung request cannot stall a run forever.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_min_call_spacing")]
    pub min_call_spacing_ms: u64,
}

fn default_min_call_spacing() -> u64 {
    10_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_call_spacing_ms: default_min_call_spacing(),
        }
    }
}

impl RateLimitConfig {
    pub fn min_call_spacing(&self) -> Duration {
        Duration::from_millis(self.min_call_spacing_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chapters requested per remote call.
    #[serde(default = "default_batch_size")]
    pub chapter_batch_size: usize,
    #[serde(default = "default_pipeline_poll")]
    pub pause_poll_ms: u64,
    /// Fail a batch whose piece count differs from the request instead of
    /// assigning pieces positionally.
    #[serde(default)]
    pub strict_chapter_split: bool,
}

fn default_batch_size() -> usize {
    3
}

fn default_pipeline_poll() -> u64 {
    500
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chapter_batch_size: default_batch_size(),
            pause_poll_ms: default_pipeline_poll(),
            strict_chapter_split: false,
        }
    }
}

impl PipelineConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Rest period after each finished job.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_queue_poll")]
    pub pause_poll_ms: u64,
}

fn default_cooldown() -> u64 {
    300
}

fn default_queue_poll() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            pause_poll_ms: default_queue_poll(),
        }
    }
}

impl QueueConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}
