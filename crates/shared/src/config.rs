//! Application configuration management.
//!
//! Configuration is read once at startup from optional `config/*.toml` files
//! layered under the process environment. The result is immutable and is
//! passed by value into the constructors that need it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// `STORAGE_MODE` is not one of the supported backends.
    #[error("invalid STORAGE_MODE '{0}': expected 'local' or 's3'")]
    InvalidStorageMode(String),

    /// A setting required by the selected mode is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Storage backend selected for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Flat directory on the local filesystem.
    Local,
    /// S3 bucket with public-read objects.
    S3,
}

impl StorageMode {
    /// Name used in responses and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            _ => Err(ConfigError::InvalidStorageMode(s.to_string())),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCorrectionLevel {
    /// ~7% recovery.
    #[default]
    Low,
    /// ~15% recovery.
    Medium,
    /// ~25% recovery.
    Quartile,
    /// ~30% recovery.
    High,
}

impl FromStr for ErrorCorrectionLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LOW" => Ok(Self::Low),
            "M" | "MEDIUM" => Ok(Self::Medium),
            "Q" | "QUARTILE" => Ok(Self::Quartile),
            "H" | "HIGH" => Ok(Self::High),
            other => Err(ConfigError::invalid(
                "QR_ERROR_CORRECTION",
                format!("'{other}' is not one of L, M, Q, H"),
            )),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Storage backend configuration.
    pub storage: StorageSettings,
    /// QR encoding parameters.
    pub qr: QrSettings,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// The single origin allowed by CORS.
    pub cors_allowed_origin: String,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Selected backend.
    pub mode: StorageMode,
    /// Root directory for local mode.
    pub local_path: PathBuf,
    /// Staging directory for atomic local writes.
    pub staging_path: PathBuf,
    /// S3 settings, present only in s3 mode.
    pub s3: Option<S3Settings>,
    /// Upper bound on a single store call.
    pub timeout: Duration,
}

/// S3 connection settings.
#[derive(Clone)]
pub struct S3Settings {
    /// Target bucket.
    pub bucket: String,
    /// Static access key, if configured.
    pub access_key: Option<String>,
    /// Static secret key, if configured.
    pub secret_key: Option<String>,
    /// AWS region.
    pub region: String,
    /// Custom S3-compatible endpoint.
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// QR encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrSettings {
    /// Smallest symbol version tried; larger versions are used when data does not fit.
    pub min_version: i16,
    /// Error-correction level.
    pub error_correction: ErrorCorrectionLevel,
    /// Pixels per module.
    pub box_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            min_version: default_qr_min_version(),
            error_correction: ErrorCorrectionLevel::Low,
            box_size: default_qr_box_size(),
            border: default_qr_border(),
        }
    }
}

/// Flat view of the sources; keys match the environment variable names.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_storage_mode")]
    storage_mode: String,
    #[serde(default = "default_local_storage_path")]
    local_storage_path: String,
    #[serde(default = "default_local_staging_path")]
    local_staging_path: String,
    #[serde(default)]
    aws_bucket_name: Option<String>,
    #[serde(default)]
    aws_access_key: Option<String>,
    #[serde(default)]
    aws_secret_key: Option<String>,
    #[serde(default = "default_aws_region")]
    aws_region: String,
    #[serde(default)]
    aws_endpoint_url: Option<String>,
    #[serde(default = "default_storage_timeout_secs")]
    storage_timeout_secs: u64,
    #[serde(default = "default_host")]
    server_host: String,
    #[serde(default = "default_port")]
    server_port: u16,
    #[serde(default = "default_cors_allowed_origin")]
    cors_allowed_origin: String,
    #[serde(default = "default_qr_min_version")]
    qr_min_version: i16,
    #[serde(default = "default_qr_error_correction")]
    qr_error_correction: String,
    #[serde(default = "default_qr_box_size")]
    qr_box_size: u32,
    #[serde(default = "default_qr_border")]
    qr_border: u32,
}

fn default_storage_mode() -> String {
    "local".to_string()
}

fn default_local_storage_path() -> String {
    "./data".to_string()
}

fn default_local_staging_path() -> String {
    "./.data-staging".to_string()
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_qr_min_version() -> i16 {
    1
}

fn default_qr_error_correction() -> String {
    "L".to_string()
}

fn default_qr_box_size() -> u32 {
    10
}

fn default_qr_border() -> u32 {
    4
}

/// Largest accepted module size in pixels.
pub const MAX_BOX_SIZE: u32 = 100;

/// Largest accepted quiet-zone width in modules.
pub const MAX_BORDER: u32 = 100;

/// Treats empty strings the same as unset variables.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid for
    /// the selected storage mode.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::default())
            .build()?;

        Self::from_raw(config.try_deserialize()?)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let mode: StorageMode = raw.storage_mode.parse()?;

        let s3 = match mode {
            StorageMode::Local => None,
            StorageMode::S3 => {
                let bucket =
                    non_empty(raw.aws_bucket_name).ok_or(ConfigError::Missing("AWS_BUCKET_NAME"))?;
                let access_key = non_empty(raw.aws_access_key);
                let secret_key = non_empty(raw.aws_secret_key);
                if access_key.is_some() != secret_key.is_some() {
                    return Err(ConfigError::invalid(
                        "AWS_ACCESS_KEY",
                        "AWS_ACCESS_KEY and AWS_SECRET_KEY must be set together",
                    ));
                }
                Some(S3Settings {
                    bucket,
                    access_key,
                    secret_key,
                    region: raw.aws_region,
                    endpoint: non_empty(raw.aws_endpoint_url),
                })
            }
        };

        if raw.storage_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "STORAGE_TIMEOUT_SECS",
                "must be greater than zero",
            ));
        }
        if !(1..=40).contains(&raw.qr_min_version) {
            return Err(ConfigError::invalid(
                "QR_MIN_VERSION",
                format!("{} is outside 1..=40", raw.qr_min_version),
            ));
        }
        if !(1..=MAX_BOX_SIZE).contains(&raw.qr_box_size) {
            return Err(ConfigError::invalid(
                "QR_BOX_SIZE",
                format!("{} is outside 1..={MAX_BOX_SIZE}", raw.qr_box_size),
            ));
        }
        if raw.qr_border > MAX_BORDER {
            return Err(ConfigError::invalid(
                "QR_BORDER",
                format!("{} exceeds {MAX_BORDER}", raw.qr_border),
            ));
        }

        Ok(Self {
            server: ServerConfig {
                host: raw.server_host,
                port: raw.server_port,
                cors_allowed_origin: raw.cors_allowed_origin,
            },
            storage: StorageSettings {
                mode,
                local_path: PathBuf::from(raw.local_storage_path),
                staging_path: PathBuf::from(raw.local_staging_path),
                s3,
                timeout: Duration::from_secs(raw.storage_timeout_secs),
            },
            qr: QrSettings {
                min_version: raw.qr_min_version,
                error_correction: raw.qr_error_correction.parse()?,
                box_size: raw.qr_box_size,
                border: raw.qr_border,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VARS: [&str; 17] = [
        "RUN_MODE",
        "STORAGE_MODE",
        "LOCAL_STORAGE_PATH",
        "LOCAL_STAGING_PATH",
        "AWS_BUCKET_NAME",
        "AWS_ACCESS_KEY",
        "AWS_SECRET_KEY",
        "AWS_REGION",
        "AWS_ENDPOINT_URL",
        "STORAGE_TIMEOUT_SECS",
        "QR_MIN_VERSION",
        "QR_ERROR_CORRECTION",
        "QR_BOX_SIZE",
        "QR_BORDER",
        "SERVER_HOST",
        "SERVER_PORT",
        "CORS_ALLOWED_ORIGIN",
    ];

    /// Runs `f` with every known variable cleared except the given overrides.
    fn with_env<R>(overrides: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f)
    }

    #[test]
    fn test_defaults() {
        let config = with_env(&[], AppConfig::load).expect("defaults should load");
        assert_eq!(config.storage.mode, StorageMode::Local);
        assert_eq!(config.storage.local_path, PathBuf::from("./data"));
        assert_eq!(config.storage.staging_path, PathBuf::from("./.data-staging"));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.timeout, Duration::from_secs(10));
        assert!(config.storage.s3.is_none());
        assert_eq!(config.server.cors_allowed_origin, "http://localhost:3000");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.qr, QrSettings::default());
    }

    #[test]
    fn test_s3_mode() {
        let config = with_env(
            &[
                ("STORAGE_MODE", "s3"),
                ("AWS_BUCKET_NAME", "codes"),
                ("AWS_ACCESS_KEY", "AKIA"),
                ("AWS_SECRET_KEY", "secret"),
            ],
            AppConfig::load,
        )
        .expect("s3 config should load");

        assert_eq!(config.storage.mode, StorageMode::S3);
        let s3 = config.storage.s3.expect("s3 settings");
        assert_eq!(s3.bucket, "codes");
        assert_eq!(s3.access_key.as_deref(), Some("AKIA"));
        assert_eq!(s3.region, "us-east-1");
        assert!(s3.endpoint.is_none());
    }

    #[test]
    fn test_s3_debug_redacts_credentials() {
        let settings = S3Settings {
            bucket: "codes".into(),
            access_key: Some("AKIA".into()),
            secret_key: Some("hunter2".into()),
            region: "us-east-1".into(),
            endpoint: None,
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("AKIA"));
        assert!(rendered.contains("codes"));
    }

    #[test]
    fn test_unknown_storage_mode_fails() {
        let err = with_env(&[("STORAGE_MODE", "ftp")], AppConfig::load).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStorageMode(ref m) if m == "ftp"));
    }

    #[test]
    fn test_s3_requires_bucket() {
        let err = with_env(&[("STORAGE_MODE", "s3")], AppConfig::load).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AWS_BUCKET_NAME")));
    }

    #[test]
    fn test_s3_rejects_half_credentials() {
        let err = with_env(
            &[
                ("STORAGE_MODE", "s3"),
                ("AWS_BUCKET_NAME", "codes"),
                ("AWS_ACCESS_KEY", "AKIA"),
            ],
            AppConfig::load,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[rstest]
    #[case("QR_MIN_VERSION", "41")]
    #[case("QR_MIN_VERSION", "0")]
    #[case("QR_BOX_SIZE", "0")]
    #[case("QR_BOX_SIZE", "101")]
    #[case("QR_BOX_SIZE", "1000000")]
    #[case("QR_BORDER", "101")]
    #[case("QR_ERROR_CORRECTION", "X")]
    #[case("STORAGE_TIMEOUT_SECS", "0")]
    fn test_invalid_settings(#[case] key: &str, #[case] value: &str) {
        let result = with_env(&[(key, value)], AppConfig::load);
        assert!(result.is_err(), "{key}={value} should be rejected");
    }

    #[test]
    fn test_upper_bounds_accepted() {
        let config = with_env(
            &[("QR_BOX_SIZE", "100"), ("QR_BORDER", "100")],
            AppConfig::load,
        )
        .expect("bounds are inclusive");
        assert_eq!(config.qr.box_size, MAX_BOX_SIZE);
        assert_eq!(config.qr.border, MAX_BORDER);
    }

    #[test]
    fn test_numeric_overrides() {
        let config = with_env(
            &[
                ("QR_BOX_SIZE", "4"),
                ("QR_ERROR_CORRECTION", "h"),
                ("SERVER_PORT", "9090"),
            ],
            AppConfig::load,
        )
        .expect("overrides should load");
        assert_eq!(config.qr.box_size, 4);
        assert_eq!(config.qr.error_correction, ErrorCorrectionLevel::High);
        assert_eq!(config.server.port, 9090);
    }

    #[rstest]
    #[case("local", StorageMode::Local)]
    #[case("S3", StorageMode::S3)]
    #[case(" s3 ", StorageMode::S3)]
    fn test_storage_mode_parse(#[case] input: &str, #[case] expected: StorageMode) {
        assert_eq!(input.parse::<StorageMode>().expect("valid mode"), expected);
    }
}
