//! Error types for the form guard.

use crate::domain::Decision;

/// Construction-time configuration errors. Raised at startup, never per request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Rate limit must allow at least one request per window")]
    ZeroLimit,

    #[error("Rate limit window must be longer than 0 ms")]
    ZeroWindow,

    #[error("CSRF token lifetime must be longer than 0 ms")]
    ZeroTokenTtl,

    #[error("Duration of {0} ms is out of range")]
    DurationOutOfRange(u64),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Reasons the request gate turns a request away.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardRejection {
    #[error("{message}")]
    QuotaExceeded {
        decision: Decision,
        message: String,
        status: u16,
    },

    #[error("Invalid CSRF token")]
    InvalidCsrfToken,
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    TooManyRequests {
        decision: Decision,
        message: String,
        status: u16,
    },

    #[error("Request body too large")]
    PayloadTooLarge,
}

impl From<GuardRejection> for AppError {
    fn from(err: GuardRejection) -> Self {
        match err {
            GuardRejection::QuotaExceeded {
                decision,
                message,
                status,
            } => AppError::TooManyRequests {
                decision,
                message,
                status,
            },
            GuardRejection::InvalidCsrfToken => AppError::Forbidden(err.to_string()),
        }
    }
}
