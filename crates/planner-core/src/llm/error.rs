//! Errors from the completion service.

use thiserror::Error;

/// Errors that can occur while talking to the completion service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service answered with a non-success status.
    #[error("{status} {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response envelope itself could not be decoded.
    #[error("invalid response from completion service: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build completion client: {0}")]
    Build(String),
}

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Network failures, request timeouts, rate limits, and 5xx responses are
    /// transient. Everything else is a permanent failure for this request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            Self::Network(_) => true,
            Self::Json(_) | Self::Build(_) => false,
        }
    }
}
