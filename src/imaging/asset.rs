//! Input rasters.
//!
//! An [`ImageAsset`] is loaded once and never mutated. The bytes sit behind an
//! `Arc` so the same asset can be shared across a batch without copying.

use super::error::PipelineError;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
    declared_mime: String,
    format: image::ImageFormat,
}

impl ImageAsset {
    /// Build an asset from raw bytes.
    ///
    /// The real format is sniffed from the magic bytes. Data that is not a
    /// raster with a compiled-in decoder, or that has a zero-sized side, is
    /// rejected as invalid input.
    pub fn from_bytes(
        bytes: impl Into<Vec<u8>>,
        declared_mime: Option<&str>,
    ) -> Result<Self, PipelineError> {
        let bytes: Vec<u8> = bytes.into();
        let format = image::guess_format(&bytes)
            .map_err(|_| PipelineError::invalid("source is not a recognized image file"))?;
        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| PipelineError::invalid(format!("cannot read image header: {e}")))?;
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid(format!(
                "image has empty dimensions {width}x{height}"
            )));
        }
        let declared_mime = declared_mime
            .map(str::to_string)
            .unwrap_or_else(|| format.to_mime_type().to_string());

        Ok(Self {
            bytes: bytes.into(),
            width,
            height,
            declared_mime,
            format,
        })
    }

    /// Read an asset from disk; the declared mime is derived from the extension.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path)?;
        let declared = image::ImageFormat::from_path(path)
            .ok()
            .map(|f| f.to_mime_type());
        Self::from_bytes(bytes, declared)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    /// Format detected from the content, which may disagree with the declared mime.
    pub fn format(&self) -> image::ImageFormat {
        self.format
    }
}
