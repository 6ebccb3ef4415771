//! # Rastersmith
//!
//! Resize raster images and synthesize icons and favicon sets, with the HTML
//! snippet and web manifest that reference them.
//!
//! # Architecture: Plan → Draw → Encode
//!
//! Every output goes through the same three steps:
//!
//! ```text
//! 1. Plan    original + intent  →  TargetDimensions   (pure integer math)
//! 2. Draw    source / spec      →  RasterSurface      (RGBA pixels in memory)
//! 3. Encode  surface + request  →  OutputArtifact     (bytes + verified mime)
//! ```
//!
//! Planning never touches pixels, so invalid requests (zero sizes, unknown
//! presets, oversized targets) are rejected before any buffer is allocated.
//! Drawing is synchronous. Encoding can run on the rayon pool and be awaited
//! as a [`imaging::PendingEncode`] future.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Planning, surfaces, icon synthesis, encoding, ICO packing, backend trait |
//! | [`presets`] | Built-in resize presets and favicon size sets |
//! | [`batch`] | Parallel multi-size export and the complete favicon bundle |
//! | [`descriptor`] | `<link>` embed snippet and `site.webmanifest` generation using Maud |
//! | [`session`] | Caller-owned resize/icon sessions: generation counter and preview slot |
//! | [`naming`] | Output filename patterns |
//! | [`config`] | `rastersmith.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Verified Output Formats
//!
//! The bytes an encoder returns are sniffed before they become an artifact.
//! A backend that quietly produced a different format than requested is an
//! error, not a surprise in the user's download. Substituting PNG for an
//! unavailable format is opt-in and always flagged on the artifact.
//!
//! ## Soft Invalidation Instead of Cancellation
//!
//! An interactive caller may fire a new request before the previous encode
//! finished. Running encodes are never aborted; instead every request takes a
//! ticket from a [`session::GenerationCounter`] and only the newest ticket's
//! result is exposed. Temporary preview files are released on replace.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, PNG,
//! JPEG, lossless WebP and AVIF encoders) and `font8x8` for text glyphs. No
//! system libraries and no font files: the binary is self-contained.

pub mod batch;
pub mod config;
pub mod descriptor;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod presets;
pub mod session;
