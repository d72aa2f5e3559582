//! Logging setup for the CLI.
//!
//! Library code logs through the `log` facade; `tracing_log::LogTracer`
//! forwards those records into the tracing subscriber so they share span
//! context with the pipeline and queue spans. Output goes to stderr to keep
//! stdout clean for exported scripts.

use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::CliError;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines
    Compact,
    /// JSON lines with span fields
    Json,
}

/// `RUST_LOG` wins over `level` when set.
fn build_env_filter(level: &str) -> Result<EnvFilter, CliError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = vec![level.to_string()];
    // Suppress noisy third-party crates
    for (target, lvl) in [("hyper", "warn"), ("hyper_util", "warn"), ("reqwest", "warn"), ("rustls", "warn"), ("h2", "warn")] {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| CliError::Logging(format!("invalid filter '{}': {}", filter_str, e)))
}

pub fn init_logging(level: &str, format: LogFormat) -> Result<(), CliError> {
    // Bridge `log` records into tracing.
    tracing_log::LogTracer::init().map_err(|e| CliError::Logging(e.to_string()))?;

    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(layer.with_filter(build_env_filter(level)?));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::Logging(e.to_string()))
}
