//! Failure of a single remote call attempt.

use std::time::Duration;

use thiserror::Error;

use super::retry_info::parse_rpc_error;

/// Maximum length of a raw error body carried in an error message.
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The server rejected the call for quota reasons, possibly with a wait hint.
    #[error("{message}")]
    QuotaExceeded {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The prompt or the answer was blocked by the content filter.
    #[error("Response blocked: {reason}")]
    Blocked { reason: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl CallError {
    /// Classifies a non-success HTTP response.
    pub fn from_http(status: u16, body: &str) -> Self {
        match parse_rpc_error(body) {
            Some(rpc) => {
                let quota = status == 429
                    || rpc.code == Some(429)
                    || rpc.status.as_deref() == Some("RESOURCE_EXHAUSTED");
                if quota {
                    CallError::QuotaExceeded {
                        message: rpc.message,
                        retry_after: rpc.retry_after,
                    }
                } else {
                    CallError::Api {
                        status,
                        message: rpc.message,
                    }
                }
            }
            None if status == 429 => CallError::QuotaExceeded {
                message: truncate_body(body),
                retry_after: None,
            },
            None => CallError::Api {
                status,
                message: truncate_body(body),
            },
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, CallError::QuotaExceeded { .. })
    }

    /// Server-suggested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CallError::QuotaExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CallError::Timeout(e.to_string())
        } else if e.is_decode() {
            CallError::Malformed(e.to_string())
        } else {
            CallError::Network(e.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_BODY_LENGTH {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", cut)
    } else {
        trimmed.to_string()
    }
}
