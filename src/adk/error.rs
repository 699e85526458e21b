// SPDX-License-Identifier: MIT

//! Typed error handling for quill-rs
//!
//! Every fallible operation in the crate returns [`Result`], which carries a
//! [`QuillError`]. Nothing in the crate retries: errors propagate to the
//! caller, who may resume the workflow from its last checkpoint.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, QuillError>;

/// Top-level error type for quill-rs
#[derive(Debug, Error)]
pub enum QuillError {
    /// API errors from external services (model providers, Blogger, OAuth)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Configuration errors (missing keys, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization failures (missing client secret, rejected consent)
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Workflow-specific errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Model/LLM-specific errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// URL construction errors
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Max iterations/revisions reached
    #[error("Max {kind} reached: {limit}")]
    MaxIterations { kind: String, limit: u32 },

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Workflow-specific errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No checkpoint stored under the session id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A checkpoint already exists under the session id
    #[error("Session already exists: {0}")]
    SessionExists(String),

    /// Session exists but is not paused at the human gate
    #[error("Session {session_id} is not suspended at the human gate (at {node})")]
    NotSuspended { session_id: String, node: String },

    /// A gate was reached without its decision being set
    #[error("No {gate} decision set; cannot choose the next node")]
    MissingDecision { gate: String },

    /// Session id unusable as a storage key
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Decision text that is neither approved nor rejected
    #[error("Invalid decision: {0:?} (expected 'Approved' or 'Rejected')")]
    InvalidDecision(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Model provider not supported
    #[error("Model provider not supported: {0}")]
    UnsupportedModel(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

impl QuillError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an authorization error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for QuillError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for QuillError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
