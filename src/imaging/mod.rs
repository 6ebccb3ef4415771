//! Raster pipeline: planning, drawing and encoding. Pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Plan** | [`plan`]: pure dimension math |
//! | **Decode** | `image` crate decoders via [`ImageBackend`] |
//! | **Resample** | `image::imageops::resize` with `Lanczos3` |
//! | **Synthesize** | shape masks + `font8x8` glyphs on a [`RasterSurface`] |
//! | **Encode** | PNG / JPEG / WebP / AVIF encoders, output sniffed with `image::guess_format` |
//! | **ICO** | PNG-embedded `.ico` container |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a request
//! - **Surface**: The one mutable bitmap type and its draw primitives
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Encoder**: Surface → [`OutputArtifact`], sync or on the rayon pool
//! - **Resample / Synth**: The two tools built from the pieces above

pub(crate) mod asset;
pub mod backend;
pub(crate) mod calculations;
pub mod encoder;
pub(crate) mod error;
pub mod ico;
pub(crate) mod params;
pub mod resample;
pub mod rust_backend;
pub mod surface;
pub mod synth;

pub use asset::ImageAsset;
pub use backend::{BackendError, ImageBackend};
pub use calculations::{TargetDimensions, plan};
pub use encoder::{OutputArtifact, PendingEncode, Settled, encode, encode_in_background};
pub use error::{EncodeFailureReason, ErrorKind, PipelineError};
pub use params::{
    Color, EncodeRequest, OutputFormat, Quality, ResizeIntent, Shape, SurfaceLimits, SynthesisSpec,
};
pub use rust_backend::RustBackend;
pub use surface::RasterSurface;
pub use synth::IconSynthesizer;
