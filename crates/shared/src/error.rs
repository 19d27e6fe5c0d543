//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Client-caused failures map to 4xx, backend failures to 5xx.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request input is missing or cannot be encoded.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend or other external service failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// An external call did not finish in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::ExternalService(_) | Self::Internal(_) => 500,
            Self::Timeout(_) => 504,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::ExternalService(msg)
            | Self::Timeout(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns true for errors caused by the caller.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
