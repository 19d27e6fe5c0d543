//! Local filesystem image store using Apache OpenDAL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};
use tracing::{debug, error, warn};

use super::backend::{ImageStore, StorageReference, unique_filename};
use super::error::StorageError;
use crate::qr::EncodedImage;

/// Writes images as `<uuid>.png` into a flat directory.
///
/// Each write lands in the staging directory first and is renamed into the
/// root only once complete, so the root never holds a truncated image. A
/// failed write removes its staged file.
///
/// Writes run on their own task and always finish, even when the caller
/// stops waiting. A write that completes after the request deadline still
/// leaves its image in the root.
pub struct LocalImageStore {
    operator: Operator,
}

impl LocalImageStore {
    /// Create the store, creating `root` and `staging` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created or the
    /// OpenDAL operator cannot be built.
    pub fn new(root: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let staging = staging.into();

        for dir in [&root, &staging] {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, &e))?;
        }

        let builder = services::Fs::default()
            .root(path_str(&root)?)
            .atomic_write_dir(path_str(&staging)?);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self { operator })
    }
}

/// Write `bytes` through the staging directory, discarding the staged file
/// if the write or the final rename fails.
async fn write_staged(operator: Operator, filename: String, bytes: Bytes) -> opendal::Result<()> {
    let mut writer = operator.writer(&filename).await?;

    let written = match writer.write(bytes).await {
        Ok(()) => writer.close().await.map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        if let Err(abort_err) = writer.abort().await {
            warn!(error = %abort_err, file = %filename, "Failed to discard staged QR image");
        }
        return Err(e);
    }
    Ok(())
}

fn path_str(path: &Path) -> Result<&str, StorageError> {
    path.to_str()
        .ok_or_else(|| StorageError::configuration(format!("non UTF-8 path: {}", path.display())))
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, image: &EncodedImage) -> Result<StorageReference, StorageError> {
        let filename = unique_filename(image.extension());

        let task = tokio::spawn(write_staged(
            self.operator.clone(),
            filename.clone(),
            image.bytes().clone(),
        ));

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, file = %filename, "Failed to write QR image");
                return Err(e.into());
            }
            Err(e) => {
                error!(error = %e, file = %filename, "QR image write task failed");
                return Err(StorageError::operation(e.to_string()));
            }
        }

        debug!(file = %filename, bytes = image.len(), "Wrote QR image");
        Ok(StorageReference::Local { filename })
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
