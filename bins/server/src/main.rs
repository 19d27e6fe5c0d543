//! qrgen API Server
//!
//! Main entry point for the QR code generation service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qrgen_api::{AppState, RouterOptions, create_router};
use qrgen_core::qr::{QrCodeService, QrEncoder};
use qrgen_core::storage::{StorageConfig, StorageProvider, build_image_store};
use qrgen_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrgen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Invalid configuration (including an unknown STORAGE_MODE) stops here,
    // before any request is served.
    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        storage_mode = %config.storage.mode,
        timeout_secs = config.storage.timeout.as_secs(),
        "Configuration loaded"
    );

    // Create storage backend
    let storage_config = StorageConfig::from_settings(&config.storage)?;
    let local_files = match &storage_config.provider {
        StorageProvider::LocalFs { root, .. } => Some(root.clone()),
        StorageProvider::S3(_) => None,
    };
    let store = build_image_store(&storage_config).await?;

    // Create application state
    let qr_service = QrCodeService::new(QrEncoder::new(config.qr), store, storage_config.timeout);
    let state = AppState {
        qr_service: Arc::new(qr_service),
    };

    // Create router
    let options = RouterOptions::new(&config.server.cors_allowed_origin, local_files)
        .context("invalid CORS_ALLOWED_ORIGIN")?;
    let app = create_router(state, options);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
