//! Agent client error types
//!
//! Request-level and timeout failures propagate to the caller as
//! [`AgentError`]. Per-event parse failures are [`StreamParseError`]s,
//! which the SSE decoder logs and discards.

use thiserror::Error;

/// Result alias for agent client operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors surfaced by the agent client.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Session creation failed. `status` is `None` when the request never
    /// produced an HTTP response.
    #[error("Failed to create session: {}", describe(.status, .reason))]
    SessionCreation { status: Option<u16>, reason: String },

    /// The `run_sse` call failed, either with a non-success status or
    /// while the response body was being read.
    #[error("API call failed: {}", describe(.status, .reason))]
    StreamRequest { status: Option<u16>, reason: String },

    /// A success response whose body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The retry budget ran out before an attempt succeeded.
    #[error("Retry timeout after {budget_ms}ms ({attempts} attempts, {elapsed_ms}ms elapsed)")]
    RetryTimeout {
        budget_ms: u64,
        elapsed_ms: u64,
        attempts: u32,
    },

    /// Form input rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub fn session_creation(status: reqwest::StatusCode) -> Self {
        Self::SessionCreation {
            status: Some(status.as_u16()),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }

    pub fn stream_request(status: reqwest::StatusCode) -> Self {
        Self::StreamRequest {
            status: Some(status.as_u16()),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }

    pub fn session_transport(error: impl std::fmt::Display) -> Self {
        Self::SessionCreation {
            status: None,
            reason: error.to_string(),
        }
    }

    pub fn stream_transport(error: impl std::fmt::Display) -> Self {
        Self::StreamRequest {
            status: None,
            reason: error.to_string(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionCreation { status, .. } | Self::StreamRequest { status, .. } => *status,
            _ => None,
        }
    }
}

fn describe(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) if reason.is_empty() => code.to_string(),
        Some(code) => format!("{} {}", code, reason),
        None => reason.to_string(),
    }
}

/// A single SSE event whose `data:` payload was not valid JSON.
#[derive(Debug, Error)]
#[error("Malformed event payload ({preview:?}): {source}")]
pub struct StreamParseError {
    /// Leading characters of the discarded payload
    pub preview: String,
    #[source]
    pub source: serde_json::Error,
}
