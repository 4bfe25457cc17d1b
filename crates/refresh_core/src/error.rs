use std::fmt;

use thiserror::Error;

use crate::FieldId;

/// Local configuration error; blocks submission and never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("days must be > 0")]
    DaysNotPositive,
    #[error("start date is required")]
    StartDateMissing,
    #[error("comment refresh mode must not be do_not_refresh when collecting comments")]
    CommentRefreshDisabled,
}

impl ValidationError {
    /// Field the user has to change to resolve the error.
    pub fn field(self) -> FieldId {
        match self {
            ValidationError::DaysNotPositive => FieldId::PostRefreshDays,
            ValidationError::StartDateMissing => FieldId::PostRefreshStartDate,
            ValidationError::CommentRefreshDisabled => FieldId::CommentRefreshMode,
        }
    }
}

/// Raw user input could not be turned into a typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field {0} is not set from text")]
    NotScalar(&'static str),
    #[error("{field}: '{value}' is not a valid number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field}: '{value}' is not a date in YYYY-MM-DD form")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field}: '{value}' is not a yes/no value")]
    InvalidFlag { field: &'static str, value: String },
    #[error("{field}: unknown option '{value}'")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    /// The backend could not be reached or did not answer in time.
    Network,
    /// The backend rejected the job specification.
    Validation,
    Unknown,
}

impl fmt::Display for SubmissionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionErrorKind::Network => write!(f, "network error"),
            SubmissionErrorKind::Validation => write!(f, "rejected by backend"),
            SubmissionErrorKind::Unknown => write!(f, "submission failed"),
        }
    }
}

/// Field-level complaint returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Launch-time failure; the job never started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct SubmissionError {
    pub kind: SubmissionErrorKind,
    pub detail: String,
    pub field_errors: Vec<FieldError>,
}

impl SubmissionError {
    pub fn new(kind: SubmissionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn validation(detail: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            kind: SubmissionErrorKind::Validation,
            detail: detail.into(),
            field_errors,
        }
    }
}
