//! QR generation error types.

use std::time::Duration;

use qrgen_shared::AppError;
use qrgen_shared::config::ErrorCorrectionLevel;
use thiserror::Error;

use crate::storage::StorageError;

/// Encoding errors.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Nothing to encode.
    #[error("input is empty")]
    EmptyInput,

    /// Input does not fit the largest QR symbol.
    #[error("input of {len} bytes exceeds QR capacity at error correction {level:?}")]
    DataTooLong {
        /// Input length in bytes.
        len: usize,
        /// Configured error-correction level.
        level: ErrorCorrectionLevel,
    },

    /// Symbol could not be built or written as PNG.
    #[error("failed to render QR image: {0}")]
    Render(String),
}

/// Errors from the encode-then-store pipeline.
#[derive(Debug, Error)]
pub enum QrCodeError {
    /// The url parameter was empty or whitespace.
    #[error("url must not be empty")]
    EmptyUrl,

    /// Encoding failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The storage backend did not answer in time.
    #[error("storage did not respond within {0:?}")]
    Timeout(Duration),
}

impl From<QrCodeError> for AppError {
    fn from(err: QrCodeError) -> Self {
        let message = err.to_string();
        match err {
            QrCodeError::EmptyUrl
            | QrCodeError::Encoding(EncodingError::EmptyInput | EncodingError::DataTooLong { .. }) => {
                Self::Validation(message)
            }
            QrCodeError::Encoding(EncodingError::Render(_)) => Self::Internal(message),
            QrCodeError::Storage(_) => Self::ExternalService(message),
            QrCodeError::Timeout(_) => Self::Timeout(message),
        }
    }
}
