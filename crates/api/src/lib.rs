//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The QR generation endpoint
//! - Health check and static file routes
//! - Error-to-response mapping

pub mod error;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use qrgen_core::qr::QrCodeService;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Encode-then-store pipeline.
    pub qr_service: Arc<QrCodeService>,
}

/// Router options fixed at startup.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// The single origin allowed by CORS.
    pub cors_origin: HeaderValue,
    /// Local storage root to expose under `/qr-codes`, if any.
    pub local_files: Option<PathBuf>,
}

impl RouterOptions {
    /// Build options from a configured origin string.
    ///
    /// # Errors
    ///
    /// Returns an error if `origin` is not a valid header value.
    pub fn new(origin: &str, local_files: Option<PathBuf>) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            cors_origin: HeaderValue::from_str(origin)?,
            local_files,
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new().merge(routes::api_routes());

    if let Some(root) = options.local_files {
        router = router.nest_service("/qr-codes", ServeDir::new(root));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list([options.cors_origin]))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
