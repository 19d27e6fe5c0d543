//! Encode-then-store pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::encoder::QrEncoder;
use super::error::QrCodeError;
use crate::storage::{ImageStore, StorageReference};

/// Generates a QR image for a URL and stores it in the configured backend.
///
/// Each call is independent: `Received -> Encoded -> Stored`, with the first
/// failure ending the request. Nothing is retried.
pub struct QrCodeService {
    encoder: QrEncoder,
    store: Arc<dyn ImageStore>,
    store_timeout: Duration,
}

impl QrCodeService {
    /// Create a new service.
    #[must_use]
    pub fn new(encoder: QrEncoder, store: Arc<dyn ImageStore>, store_timeout: Duration) -> Self {
        Self {
            encoder,
            store,
            store_timeout,
        }
    }

    /// Name of the storage backend in use.
    #[must_use]
    pub fn storage_provider(&self) -> &'static str {
        self.store.provider_name()
    }

    /// Encode `url` and persist the image.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `url` is empty or only whitespace
    /// - `url` does not fit a QR symbol
    /// - The store fails or exceeds the store timeout
    pub async fn generate(&self, url: &str) -> Result<StorageReference, QrCodeError> {
        if url.trim().is_empty() {
            return Err(QrCodeError::EmptyUrl);
        }

        let image = self.encoder.encode(url)?;
        debug!(
            bytes = image.len(),
            width = image.width(),
            height = image.height(),
            "Encoded QR image"
        );

        let Ok(stored) = tokio::time::timeout(self.store_timeout, self.store.store(&image)).await
        else {
            warn!(
                provider = self.store.provider_name(),
                timeout_ms = u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX),
                "Store call timed out"
            );
            return Err(QrCodeError::Timeout(self.store_timeout));
        };
        let reference = stored?;

        info!(
            provider = self.store.provider_name(),
            reference = %reference,
            "Stored QR image"
        );
        Ok(reference)
    }
}
