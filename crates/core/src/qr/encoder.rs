//! QR symbol encoding and PNG rendering.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, imageops};
use qrcode::QrCode;
use qrcode::types::{EcLevel, QrError, Version};
use qrgen_shared::config::{ErrorCorrectionLevel, QrSettings};

use super::error::EncodingError;
use super::types::EncodedImage;

/// Largest QR symbol version.
const MAX_VERSION: i16 = 40;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Deterministic QR encoder.
///
/// The same input and settings always produce byte-identical PNG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder {
    settings: QrSettings,
}

impl QrEncoder {
    /// Create an encoder with fixed parameters.
    #[must_use]
    pub fn new(settings: QrSettings) -> Self {
        Self { settings }
    }

    /// Encode `data` into a black-on-white grayscale PNG.
    ///
    /// The smallest symbol version not below `min_version` that holds the
    /// data is used. The image side is `(modules + 2 * border) * box_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long for a version 40
    /// symbol, or the PNG cannot be written.
    pub fn encode(&self, data: &str) -> Result<EncodedImage, EncodingError> {
        if data.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        let code = self.fit_symbol(data.as_bytes())?;
        let box_size = self.settings.box_size;

        let symbol: GrayImage = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(box_size, box_size)
            .dark_color(DARK)
            .light_color(LIGHT)
            .build();

        let pad = self
            .settings
            .border
            .checked_mul(box_size)
            .ok_or_else(|| EncodingError::Render("border too large".into()))?;
        let side = symbol
            .width()
            .checked_add(pad.saturating_mul(2))
            .ok_or_else(|| EncodingError::Render("image too large".into()))?;

        let mut canvas = GrayImage::from_pixel(side, side, LIGHT);
        imageops::replace(&mut canvas, &symbol, i64::from(pad), i64::from(pad));

        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(canvas)
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| EncodingError::Render(e.to_string()))?;

        Ok(EncodedImage::png(Bytes::from(out.into_inner()), side, side))
    }

    /// Build the smallest symbol at or above the configured version.
    fn fit_symbol(&self, data: &[u8]) -> Result<QrCode, EncodingError> {
        let level = ec_level(self.settings.error_correction);

        for version in self.settings.min_version.max(1)..=MAX_VERSION {
            match QrCode::with_version(data, Version::Normal(version), level) {
                Ok(code) => return Ok(code),
                Err(QrError::DataTooLong) => {}
                Err(e) => return Err(EncodingError::Render(e.to_string())),
            }
        }

        Err(EncodingError::DataTooLong {
            len: data.len(),
            level: self.settings.error_correction,
        })
    }
}

fn ec_level(level: ErrorCorrectionLevel) -> EcLevel {
    match level {
        ErrorCorrectionLevel::Low => EcLevel::L,
        ErrorCorrectionLevel::Medium => EcLevel::M,
        ErrorCorrectionLevel::Quartile => EcLevel::Q,
        ErrorCorrectionLevel::High => EcLevel::H,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Decode the first QR symbol found in a PNG.
    fn decode(image: &EncodedImage) -> String {
        let gray = image::load_from_memory(image.bytes())
            .expect("valid png")
            .to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one symbol");
        let (_, content) = grids[0].decode().expect("decodable symbol");
        content
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = QrEncoder::default().encode("").unwrap_err();
        assert!(matches!(err, EncodingError::EmptyInput));
    }

    #[test]
    fn test_data_too_long() {
        let data = "a".repeat(4000);
        let err = QrEncoder::default().encode(&data).unwrap_err();
        assert!(matches!(err, EncodingError::DataTooLong { len: 4000, .. }));
    }

    #[test]
    fn test_output_is_png() {
        let image = QrEncoder::default()
            .encode("https://example.com")
            .expect("should encode");
        assert!(image.bytes().starts_with(b"\x89PNG\r\n\x1a\n"));
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_default_dimensions() {
        // 19 bytes needs version 2 (25 modules) at level L; 4 module border, 10 px boxes.
        let image = QrEncoder::default()
            .encode("https://example.com")
            .expect("should encode");
        assert_eq!(image.width(), (25 + 8) * 10);
        assert_eq!(image.height(), image.width());

        let decoded = image::load_from_memory(image.bytes()).expect("valid png");
        assert_eq!(decoded.width(), image.width());
    }

    #[test]
    fn test_min_version_respected() {
        let encoder = QrEncoder::new(QrSettings {
            min_version: 5,
            ..QrSettings::default()
        });
        let image = encoder.encode("hi").expect("should encode");
        // Version 5 has 37 modules per side.
        assert_eq!(image.width(), (37 + 8) * 10);
    }

    #[test]
    fn test_custom_box_and_border() {
        let encoder = QrEncoder::new(QrSettings {
            box_size: 1,
            border: 0,
            ..QrSettings::default()
        });
        let image = encoder.encode("hi").expect("should encode");
        assert_eq!(image.width(), 21);
    }

    #[test]
    fn test_border_is_light() {
        let image = QrEncoder::default().encode("hi").expect("should encode");
        let gray = image::load_from_memory(image.bytes())
            .expect("valid png")
            .to_luma8();
        let border_px = 4 * 10;
        for i in 0..gray.width() {
            for j in 0..border_px {
                assert_eq!(gray.get_pixel(i, j).0[0], 255);
                assert_eq!(gray.get_pixel(j, i).0[0], 255);
            }
        }
        // Top-left finder pattern starts dark right after the border.
        assert_eq!(gray.get_pixel(border_px, border_px).0[0], 0);
    }

    #[test]
    fn test_deterministic() {
        let encoder = QrEncoder::default();
        let a = encoder.encode("https://example.com").expect("should encode");
        let b = encoder.encode("https://example.com").expect("should encode");
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_correction_changes_output() {
        let low = QrEncoder::default().encode("https://example.com").expect("encode");
        let high = QrEncoder::new(QrSettings {
            error_correction: ErrorCorrectionLevel::High,
            ..QrSettings::default()
        })
        .encode("https://example.com")
        .expect("encode");
        assert_ne!(low.bytes(), high.bytes());
        assert!(high.width() > low.width());
    }

    #[rstest]
    #[case("https://example.com")]
    #[case("HELLO WORLD 123")]
    #[case("https://example.com/a/very/long/path?with=query&and=more&params=1234567890")]
    #[case("mailto:someone@example.com?subject=Hi%20there")]
    fn test_round_trip(#[case] url: &str) {
        let image = QrEncoder::default().encode(url).expect("should encode");
        assert_eq!(decode(&image), url);
    }

    #[rstest]
    #[case(ErrorCorrectionLevel::Medium)]
    #[case(ErrorCorrectionLevel::Quartile)]
    #[case(ErrorCorrectionLevel::High)]
    fn test_round_trip_per_level(#[case] level: ErrorCorrectionLevel) {
        let encoder = QrEncoder::new(QrSettings {
            error_correction: level,
            ..QrSettings::default()
        });
        let image = encoder.encode("https://example.com").expect("should encode");
        assert_eq!(decode(&image), "https://example.com");
    }
}
