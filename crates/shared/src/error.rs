use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    PayloadTooLarge,
    Unauthorized,
    RateLimited,
    Internal,
}

/// Error body a report endpoint may return alongside a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ReportApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ReportException {
    pub code: ErrorCode,
    pub message: String,
}

impl From<ReportApiError> for ReportException {
    fn from(value: ReportApiError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
