//! Bitmap encoding for upload.
//!
//! PNG is used when compression is off. With compression on, frames are
//! JPEG-encoded and the quality is stepped down until the payload fits the
//! configured size budget or the quality floor is reached.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lowest JPEG quality tried while shrinking a payload.
pub const QUALITY_FLOOR: u8 = 10;

/// Quality reduction per re-encode.
pub const QUALITY_STEP: u8 = 10;

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// Compression settings persisted with the app config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub enabled: bool,
    /// Starting JPEG quality, 1-100
    pub quality: u8,
    /// Target payload size in kilobytes
    pub max_size_kb: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: 85,
            max_size_kb: 500,
        }
    }
}

/// An encoded image ready to embed in a request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Final JPEG quality; `None` for lossless output
    pub quality: Option<u8>,
    /// Number of encoder passes it took
    pub attempts: u32,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:<mime>;base64,<payload>` for the `image_url` field.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Encode a bitmap, shrinking JPEG output to fit `max_kb` where possible.
///
/// Lossless output is produced when compression is disabled or the format is
/// PNG. Otherwise the last JPEG attempt is returned even if still over budget.
pub fn encode(
    bitmap: &RgbaImage,
    format: ImageFormat,
    compression_enabled: bool,
    quality: u8,
    max_kb: u32,
) -> Result<EncodedImage> {
    let (width, height) = bitmap.dimensions();

    if !compression_enabled || !format.is_lossy() {
        return Ok(EncodedImage {
            bytes: encode_png(bitmap)?,
            format: ImageFormat::Png,
            quality: None,
            attempts: 1,
            width,
            height,
        });
    }

    let rgb: RgbImage = bitmap.convert();
    let budget = u64::from(max_kb) * 1024;
    let mut quality = quality.clamp(1, 100);
    let mut attempts = 1;
    let mut bytes = encode_jpeg(&rgb, quality)?;

    while bytes.len() as u64 > budget && quality > QUALITY_FLOOR {
        quality = quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
        bytes = encode_jpeg(&rgb, quality)?;
        attempts += 1;
    }

    tracing::debug!(
        "Encoded {}x{} JPEG at quality {} in {} attempt(s): {} bytes",
        width,
        height,
        quality,
        attempts,
        bytes.len()
    );

    Ok(EncodedImage {
        bytes,
        format: ImageFormat::Jpeg,
        quality: Some(quality),
        attempts,
        width,
        height,
    })
}

/// Encode with persisted settings.
pub fn encode_with(bitmap: &RgbaImage, settings: &CompressionSettings) -> Result<EncodedImage> {
    let format = if settings.enabled {
        ImageFormat::Jpeg
    } else {
        ImageFormat::Png
    };
    encode(
        bitmap,
        format,
        settings.enabled,
        settings.quality,
        settings.max_size_kb,
    )
}

/// Load a PNG, JPEG or BMP file into an RGBA bitmap.
pub fn decode_file(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)?;
    Ok(img.to_rgba8())
}

fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        bitmap.as_raw(),
        bitmap.width(),
        bitmap.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Noisy image that compresses poorly.
    fn noisy(width: u32, height: u32) -> RgbaImage {
        let mut state: u32 = 0x1234_5678;
        RgbaImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgba([r, g, b, 255])
        })
    }

    #[test]
    fn test_png_when_compression_disabled() {
        let img = noisy(32, 32);
        let encoded = encode(&img, ImageFormat::Jpeg, false, 80, 1).unwrap();
        assert_eq!(encoded.format, ImageFormat::Png);
        assert_eq!(encoded.quality, None);
        assert_eq!(encoded.attempts, 1);
        assert!(encoded.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_png_format_is_lossless_even_with_compression() {
        let img = noisy(16, 16);
        let encoded = encode(&img, ImageFormat::Png, true, 80, 1).unwrap();
        assert_eq!(encoded.format, ImageFormat::Png);
    }

    #[test]
    fn test_fits_budget_in_one_pass() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255]));
        let encoded = encode(&img, ImageFormat::Jpeg, true, 90, 500).unwrap();
        assert_eq!(encoded.attempts, 1);
        assert_eq!(encoded.quality, Some(90));
        assert!(encoded.bytes.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_unreachable_budget_stops_at_floor() {
        let img = noisy(256, 256);
        let encoded = encode(&img, ImageFormat::Jpeg, true, 100, 1).unwrap();

        assert_eq!(encoded.quality, Some(QUALITY_FLOOR));
        assert_eq!(encoded.attempts, 10);

        // Still over budget, and identical to a direct floor-quality encode
        assert!(encoded.len() > 1024);
        let rgb: RgbImage = img.convert();
        let floor = encode_jpeg(&rgb, QUALITY_FLOOR).unwrap();
        assert_eq!(encoded.len(), floor.len());
    }

    #[test]
    fn test_odd_quality_clamps_to_floor() {
        let img = noisy(128, 128);
        let encoded = encode(&img, ImageFormat::Jpeg, true, 15, 1).unwrap();
        assert_eq!(encoded.quality, Some(QUALITY_FLOOR));
        assert_eq!(encoded.attempts, 2);
    }

    #[test]
    fn test_smaller_budget_never_raises_quality() {
        let img = noisy(200, 200);
        let loose = encode(&img, ImageFormat::Jpeg, true, 90, 10_000).unwrap();
        let tight = encode(&img, ImageFormat::Jpeg, true, 90, 8).unwrap();
        assert!(tight.quality <= loose.quality);
        assert!(tight.len() <= loose.len());
    }

    #[test]
    fn test_data_uri_follows_format() {
        let img = noisy(8, 8);
        let jpeg = encode(&img, ImageFormat::Jpeg, true, 80, 500).unwrap();
        assert!(jpeg.data_uri().starts_with("data:image/jpeg;base64,"));
        let png = encode(&img, ImageFormat::Png, false, 80, 500).unwrap();
        assert!(png.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_decode_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("shot.png");
        noisy(20, 10).save(&path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
        assert!(decode_file(&temp.path().join("missing.png")).is_err());
    }
}
