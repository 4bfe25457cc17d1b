use std::fmt;

use refresh_core::JobHandle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendFailure,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFailure {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    /// The response body did not have the expected shape.
    Malformed,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFailure::InvalidUrl => write!(f, "invalid url"),
            BackendFailure::Network => write!(f, "network error"),
            BackendFailure::Timeout => write!(f, "timeout"),
            BackendFailure::HttpStatus(code) => write!(f, "http status {code}"),
            BackendFailure::Malformed => write!(f, "malformed response"),
        }
    }
}

/// What the backend returns for an accepted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAck {
    pub handle: JobHandle,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}
