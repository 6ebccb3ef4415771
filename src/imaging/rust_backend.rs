//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality-aware, RGB only) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! AVIF is encode-only: the `image` crate's `"avif"` feature enables the
//! rav1e encoder but no decoder, so AVIF inputs are rejected at decode time.

use super::asset::ImageAsset;
use super::backend::{BackendError, ImageBackend};
use super::params::{OutputFormat, Quality};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_error(format: OutputFormat, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        mime: format.mime().to_string(),
        message: err.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, asset: &ImageAsset) -> Result<DynamicImage, BackendError> {
        if asset.format() == ImageFormat::Avif {
            return Err(BackendError::Decode(
                "AVIF sources cannot be decoded, only produced".to_string(),
            ));
        }
        ImageReader::with_format(Cursor::new(asset.bytes()), asset.format())
            .decode()
            .map_err(|e| {
                BackendError::Decode(format!(
                    "Failed to decode {} source: {e}",
                    asset.declared_mime()
                ))
            })
    }

    fn encode(
        &self,
        pixels: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let (width, height) = pixels.dimensions();
        let mut buf = Vec::new();

        match format {
            OutputFormat::Png => PngEncoder::new(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel; callers flatten first.
                let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, quality.value() as u8).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            OutputFormat::WebP => WebPEncoder::new_lossless(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            OutputFormat::Avif => {
                AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality.value() as u8)
                    .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            }
        }
        .map_err(|e| encode_error(format, e))?;

        Ok(buf)
    }
}
