//! Storage backend abstraction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::local::LocalImageStore;
use super::s3::S3ImageStore;
use crate::qr::EncodedImage;

/// Where a stored image can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageReference {
    /// Bare filename inside the local root directory.
    Local {
        /// `<uuid>.png`
        filename: String,
    },
    /// Public URL of an uploaded object.
    Remote {
        /// Virtual-hosted-style object URL.
        url: String,
    },
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { filename } => f.write_str(filename),
            Self::Remote { url } => f.write_str(url),
        }
    }
}

/// Persists encoded images and returns a caller-facing reference.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `image` under a freshly generated unique name.
    async fn store(&self, image: &EncodedImage) -> Result<StorageReference, StorageError>;

    /// Provider name ("local" or "s3").
    fn provider_name(&self) -> &'static str;
}

/// Unique file name for an image: `<uuid-v4>.<ext>`.
#[must_use]
pub fn unique_filename(extension: &str) -> String {
    format!("{}.{extension}", Uuid::new_v4())
}

/// Construct the backend selected by `config`.
///
/// Called once at startup; the returned store is shared by every request.
///
/// # Errors
///
/// Returns an error if the local root cannot be created or the provider
/// configuration is rejected.
pub async fn build_image_store(config: &StorageConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    debug!(
        provider = config.provider.name(),
        timeout_secs = config.timeout.as_secs(),
        "Building storage backend"
    );

    let store: Arc<dyn ImageStore> = match &config.provider {
        StorageProvider::LocalFs { root, staging } => {
            Arc::new(LocalImageStore::new(root.clone(), staging.clone())?)
        }
        StorageProvider::S3(options) => {
            Arc::new(S3ImageStore::connect(options, &config.key_prefix, config.timeout).await)
        }
    };

    info!(provider = store.provider_name(), "Storage backend ready");
    Ok(store)
}
