//! Encoded image type.

use bytes::Bytes;

/// A rendered QR symbol as PNG bytes.
///
/// Produced by [`QrEncoder::encode`](super::QrEncoder::encode) and handed to
/// exactly one store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Bytes,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// MIME type of every encoded image.
    pub const CONTENT_TYPE: &'static str = "image/png";
    /// File extension of every encoded image.
    pub const EXTENSION: &'static str = "png";

    pub(crate) fn png(bytes: Bytes, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    /// Raw PNG bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the encoded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if no bytes were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type for upload headers.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    /// Extension used when naming stored files.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        Self::EXTENSION
    }
}
