//! Storage configuration types.

use std::path::PathBuf;
use std::time::Duration;

use qrgen_shared::config::{StorageMode, StorageSettings};

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// AWS S3 or an S3-compatible service.
    S3(S3Options),
    /// Flat directory on the local filesystem.
    LocalFs {
        /// Directory that receives the images.
        root: PathBuf,
        /// Directory holding in-flight writes before they are renamed into `root`.
        staging: PathBuf,
    },
}

/// Connection options for the S3 provider.
#[derive(Clone)]
pub struct S3Options {
    /// Target bucket.
    pub bucket: String,
    /// AWS region.
    pub region: String,
    /// Static access key id; the SDK default chain is used when unset.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible services (path-style addressing).
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for S3Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Options")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("static_credentials", &self.access_key_id.is_some())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> Self {
        Self::LocalFs {
            root: root.into(),
            staging: staging.into(),
        }
    }

    /// Provider name, as reported in responses.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Prefix for object keys (S3 only).
    pub key_prefix: String,
    /// Upper bound on a single store call.
    pub timeout: Duration,
}

impl StorageConfig {
    /// Default object key prefix.
    pub const DEFAULT_KEY_PREFIX: &'static str = "qr_codes/";
    /// Default store timeout: 10 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set store timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if s3 mode is selected without s3 settings.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.mode {
            StorageMode::Local => {
                StorageProvider::local_fs(
                    settings.local_path.clone(),
                    settings.staging_path.clone(),
                )
            }
            StorageMode::S3 => {
                let s3 = settings
                    .s3
                    .as_ref()
                    .ok_or_else(|| StorageError::configuration("s3 mode requires s3 settings"))?;
                StorageProvider::S3(S3Options {
                    bucket: s3.bucket.clone(),
                    region: s3.region.clone(),
                    access_key_id: s3.access_key.clone(),
                    secret_access_key: s3.secret_key.clone(),
                    endpoint: s3.endpoint.clone(),
                })
            }
        };

        Ok(Self::new(provider).with_timeout(settings.timeout))
    }
}
