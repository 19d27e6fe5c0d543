//! Image storage backends.
//!
//! One backend is selected at startup and shared behind [`ImageStore`]:
//! - Local filesystem via Apache OpenDAL (staged writes, atomic rename)
//! - AWS S3 via the AWS SDK (public-read objects)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              ImageStore::store(&EncodedImage)                │
//! ├─────────────────────────────┬────────────────────────────────┤
//! │ LocalImageStore             │ S3ImageStore                   │
//! │ op.write("<uuid>.png")      │ put_object("qr_codes/<uuid>")  │
//! │ -> Local { filename }       │ -> Remote { url }              │
//! └─────────────────────────────┴────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
mod local;
mod s3;

pub use backend::{ImageStore, StorageReference, build_image_store, unique_filename};
pub use config::{S3Options, StorageConfig, StorageProvider};
pub use error::StorageError;
pub use local::LocalImageStore;
pub use s3::{S3ImageStore, public_url};
