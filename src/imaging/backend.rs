//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the pipeline and whatever
//! actually turns bytes into pixels and back:
//!
//! | Operation | Input | Output |
//! |---|---|---|
//! | `decode` | [`ImageAsset`] | `DynamicImage` |
//! | `encode` | RGBA pixels + [`OutputFormat`] + [`Quality`] | encoded bytes |
//! | `supports` | [`OutputFormat`] | whether `encode` can be asked for it |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. A backend is free to hand back bytes in a format other than the one
//! asked for; the [encoder](super::encoder) sniffs every result and refuses
//! to pass that off as success.

use super::asset::ImageAsset;
use super::params::{OutputFormat, Quality};
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode to {mime} failed: {message}")]
    Encode { mime: String, message: String },
}

/// Trait for codec backends.
///
/// Backends must be `Send + Sync`: batch export calls them from rayon
/// workers and background encodes move them onto the pool.
pub trait ImageBackend: Send + Sync {
    /// Decode the asset's bytes into pixels.
    fn decode(&self, asset: &ImageAsset) -> Result<DynamicImage, BackendError>;

    /// Encode straight-alpha RGBA pixels.
    ///
    /// `quality` only matters for lossy formats.
    fn encode(
        &self,
        pixels: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Whether this backend has an encoder for `format`.
    fn supports(&self, _format: OutputFormat) -> bool {
        true
    }
}
