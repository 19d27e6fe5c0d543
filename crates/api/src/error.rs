//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qrgen_core::qr::QrCodeError;
use qrgen_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Handler error rendered as `{"detail": "<message>"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<QrCodeError> for ApiError {
    fn from(err: QrCodeError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_client_error() {
            warn!(code = self.0.error_code(), error = %self.0, "Rejected request");
        } else {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }

        (status, Json(json!({ "detail": self.0.message() }))).into_response()
    }
}
