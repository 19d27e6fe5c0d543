//! Storage error types.

use std::path::Path;

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Local filesystem error outside OpenDAL (directory setup).
    #[error("storage I/O error at {path}: {message}")]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// Remote upload was rejected or could not be sent.
    #[error("upload failed: {message}")]
    Upload {
        /// Underlying error message.
        message: String,
    },

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an I/O error for `path`.
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create an upload error.
    #[must_use]
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload {
            message: msg.into(),
        }
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}
