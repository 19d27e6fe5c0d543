//! S3 image store using the AWS SDK.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tracing::{debug, error, info};

use super::backend::{ImageStore, StorageReference, unique_filename};
use super::config::S3Options;
use super::error::StorageError;
use crate::qr::EncodedImage;

/// Uploads images as public-read objects under a fixed key prefix.
///
/// One client is built at startup and shared by every request.
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    key_prefix: String,
}

impl S3ImageStore {
    /// Build the SDK client.
    ///
    /// SDK retries are disabled and every operation is bounded by `timeout`.
    pub async fn connect(options: &S3Options, key_prefix: &str, timeout: Duration) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());

        if let (Some(key), Some(secret)) = (&options.access_key_id, &options.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "qrgen-static",
            ));
        }
        if let Some(endpoint) = &options.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(options.endpoint.is_some())
            .build();

        info!(
            bucket = %options.bucket,
            region = %options.region,
            endpoint = options.endpoint.as_deref().unwrap_or("aws"),
            "S3 client configured"
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: options.bucket.clone(),
            key_prefix: key_prefix.to_string(),
        }
    }

    /// Generate a fresh object key: `<prefix><uuid>.<ext>`.
    fn object_key(&self, extension: &str) -> String {
        format!("{}{}", self.key_prefix, unique_filename(extension))
    }
}

/// Public virtual-hosted-style URL of an object.
///
/// Depends only on `bucket` and `key`.
#[must_use]
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{bucket}.s3.amazonaws.com/{key}")
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, image: &EncodedImage) -> Result<StorageReference, StorageError> {
        let key = self.object_key(image.extension());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image.bytes().clone()))
            .content_type(image.content_type())
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                error!(bucket = %self.bucket, key = %key, error = %message, "S3 upload failed");
                StorageError::upload(message)
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = image.len(), "Uploaded QR image");
        Ok(StorageReference::Remote {
            url: public_url(&self.bucket, &key),
        })
    }

    fn provider_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::QrEncoder;

    fn unreachable_options() -> S3Options {
        S3Options {
            bucket: "codes".into(),
            region: "us-east-1".into(),
            access_key_id: Some("AKIAEXAMPLE".into()),
            secret_access_key: Some("secret".into()),
            // Nothing listens on port 1.
            endpoint: Some("http://127.0.0.1:1".into()),
        }
    }

    #[test]
    fn test_public_url_format() {
        assert_eq!(
            public_url("codes", "qr_codes/abc.png"),
            "https://codes.s3.amazonaws.com/qr_codes/abc.png"
        );
    }

    #[test]
    fn test_public_url_is_pure() {
        let a = public_url("codes", "qr_codes/abc.png");
        let b = public_url("codes", "qr_codes/abc.png");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_object_key_uses_prefix() {
        let store =
            S3ImageStore::connect(&unreachable_options(), "qr_codes/", Duration::from_secs(2)).await;
        let key = store.object_key("png");
        assert!(key.starts_with("qr_codes/"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.len(), "qr_codes/".len() + 36 + 4);
        assert_eq!(store.provider_name(), "s3");
    }

    #[tokio::test]
    async fn test_store_fails_when_endpoint_unreachable() {
        let store =
            S3ImageStore::connect(&unreachable_options(), "qr_codes/", Duration::from_secs(2)).await;
        let image = QrEncoder::default()
            .encode("https://example.com")
            .expect("should encode");

        let err = store.store(&image).await.unwrap_err();
        assert!(matches!(err, StorageError::Upload { .. }));
    }
}
