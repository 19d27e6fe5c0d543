//! Shared configuration and error types for qrgen.
//!
//! This crate provides common types used across all other crates:
//! - Process-wide configuration loaded once at startup
//! - Application-wide error types with HTTP status mapping

pub mod config;
pub mod error;

pub use config::{AppConfig, ConfigError, StorageMode};
pub use error::AppError;
