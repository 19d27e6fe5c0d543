//! QR code generation route.

use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    routing::post,
};
use qrgen_core::storage::StorageReference;
use qrgen_shared::AppError;
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// Creates the QR routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/generate-qr/", post(generate_qr))
        .route("/generate-qr", post(generate_qr))
}

/// Response for a stored QR image, tagged by storage mode.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "mode")]
pub enum GenerateQrResponse {
    /// Stored on the local filesystem.
    #[serde(rename = "local")]
    Local {
        /// Bare filename inside the storage root.
        file: String,
    },
    /// Uploaded to S3.
    #[serde(rename = "s3")]
    S3 {
        /// Public object URL.
        qr_code_url: String,
    },
}

impl From<StorageReference> for GenerateQrResponse {
    fn from(reference: StorageReference) -> Self {
        match reference {
            StorageReference::Local { filename } => Self::Local { file: filename },
            StorageReference::Remote { url } => Self::S3 { qr_code_url: url },
        }
    }
}

/// POST `/generate-qr/?url=<string>`
/// Encode the url as a PNG QR code and store it.
async fn generate_qr(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<GenerateQrResponse>, ApiError> {
    let url = url_param(query.as_deref().unwrap_or_default())?;

    let reference = state.qr_service.generate(&url).await?;
    Ok(Json(reference.into()))
}

/// Extract the single `url` value from a raw query string.
///
/// Values must decode to valid UTF-8 so the stored symbol carries exactly
/// what the caller sent.
fn url_param(query: &str) -> Result<String, AppError> {
    let mut url = None;

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(key)? != "url" {
            continue;
        }
        if url.replace(decode_component(value)?).is_some() {
            return Err(AppError::Validation("duplicate query parameter: url".into()));
        }
    }

    url.ok_or_else(|| AppError::Validation("missing query parameter: url".into()))
}

fn decode_component(raw: &str) -> Result<String, AppError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(Cow::into_owned)
        .map_err(|_| AppError::Validation("query parameter is not valid UTF-8".into()))
}
