//! QR code generation.
//!
//! [`QrEncoder`] turns a string into a PNG symbol; [`QrCodeService`] hands the
//! image to the configured [`ImageStore`](crate::storage::ImageStore) and
//! returns the resulting reference.

mod encoder;
mod error;
mod service;
mod types;

pub use encoder::QrEncoder;
pub use error::{EncodingError, QrCodeError};
pub use service::QrCodeService;
pub use types::EncodedImage;
