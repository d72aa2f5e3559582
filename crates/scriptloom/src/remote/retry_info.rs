//! Google RPC error bodies and their `RetryInfo` hint.

use std::time::Duration;

use serde::Deserialize;

const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

/// Longest server-requested wait honored. Larger hints are clamped to it.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(3_600);

#[derive(Debug, Deserialize)]
struct Envelope {
    error: RpcBody,
}

#[derive(Debug, Deserialize)]
struct RpcBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

/// The parts of a Google RPC error this crate acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: Option<u16>,
    pub status: Option<String>,
    pub message: String,
    pub retry_after: Option<Duration>,
}

/// Parses `{"error": {...}}`. Returns `None` for anything else.
pub fn parse_rpc_error(body: &str) -> Option<RpcError> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    let rpc = envelope.error;

    let retry_after = rpc
        .details
        .iter()
        .filter(|d| d.get("@type").and_then(|t| t.as_str()) == Some(RETRY_INFO_TYPE))
        .find_map(|d| d.get("retryDelay").and_then(|v| v.as_str()))
        .and_then(parse_retry_delay);

    Some(RpcError {
        code: rpc.code,
        status: rpc.status,
        message: rpc.message,
        retry_after,
    })
}

/// Parses a protobuf JSON duration such as `"31s"` or `"2.5s"`.
///
/// Zero, negative, and unparseable values yield `None`. Values above
/// [`MAX_RETRY_DELAY`] are clamped.
pub fn parse_retry_delay(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.trim().parse().ok()?;
    if secs.is_nan() || secs <= 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_DELAY);
    Some(delay.min(MAX_RETRY_DELAY))
}
