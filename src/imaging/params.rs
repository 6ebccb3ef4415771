//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between callers (CLI, sessions, batch export) and the pixel work
//! in [`surface`](super::surface), [`synth`](super::synth) and
//! [`encoder`](super::encoder).
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Color`]: RGBA color parsed from CSS hex (`#rgb`, `#rrggbb`, `#rrggbbaa`) or `transparent`.
//! - [`Shape`]: icon outline (square, rounded, circle).
//! - [`OutputFormat`]: the encodable formats and their mime types.
//! - [`ResizeIntent`]: how the resize tool chooses its target box.
//! - [`SynthesisSpec`]: everything needed to draw one icon.
//! - [`SurfaceLimits`]: allocation ceiling for raster surfaces.
//! - [`EncodeRequest`]: requested mime, quality and fallback policy.

use super::asset::ImageAsset;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        let hex = trimmed.trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{input}'"));
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let parsed = match hex.len() {
            // #rgb expands each nibble: "f80" → "ff8800"
            3 => {
                let mut it = hex.chars().map(|c| channel(&format!("{c}{c}")));
                match (it.next(), it.next(), it.next()) {
                    (Some(Some(r)), Some(Some(g)), Some(Some(b))) => Some(Self::rgb(r, g, b)),
                    _ => None,
                }
            }
            6 | 8 => {
                let r = channel(&hex[0..2]);
                let g = channel(&hex[2..4]);
                let b = channel(&hex[4..6]);
                let a = if hex.len() == 8 {
                    channel(&hex[6..8])
                } else {
                    Some(255)
                };
                match (r, g, b, a) {
                    (Some(r), Some(g), Some(b), Some(a)) => Some(Self { r, g, b, a }),
                    _ => None,
                }
            }
            _ => None,
        };
        parsed.ok_or_else(|| format!("invalid color '{input}' (expected #rgb, #rrggbb or #rrggbbaa)"))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Outline of a synthesized icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Square,
    #[default]
    Rounded,
    Circle,
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "rounded" => Ok(Self::Rounded),
            "circle" => Ok(Self::Circle),
            other => Err(format!(
                "unknown shape '{other}' (expected square, rounded or circle)"
            )),
        }
    }
}

/// Formats the encoder can be asked for.
///
/// WebP is encoded lossless by the pure-Rust encoder, so only JPEG and AVIF
/// honor a [`Quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Png, Self::Jpeg, Self::WebP, Self::Avif];

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::Avif)
    }

    /// Look up a format by mime type (`image/jpeg`) or extension (`jpg`).
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "image/png" | "png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => Some(Self::Jpeg),
            "image/webp" | "webp" => Some(Self::WebP),
            "image/avif" | "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
            Self::Avif => ImageFormat::Avif,
        }
    }
}

/// How the resize tool picks its target dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeIntent {
    /// Explicit target box. A missing side is solved from the original ratio.
    Dimensions {
        width: Option<u32>,
        height: Option<u32>,
        lock_aspect: bool,
    },
    /// Uniform scale in percent; above 100 upscales.
    Percentage { pct: f64 },
    /// Named box from the preset catalog.
    Preset { name: String, lock_aspect: bool },
}

/// Everything needed to draw one icon.
///
/// `source_image` takes precedence over `text`; with neither the icon is
/// background-only.
#[derive(Debug, Clone)]
pub struct SynthesisSpec {
    pub size_px: u32,
    pub shape: Shape,
    pub background_color: Color,
    pub foreground_color: Color,
    pub text: Option<String>,
    pub source_image: Option<ImageAsset>,
    /// Glyph height as a fraction of `size_px`, in `(0, 1]`.
    pub text_size_fraction: f32,
}

impl Default for SynthesisSpec {
    fn default() -> Self {
        Self {
            size_px: 512,
            shape: Shape::default(),
            background_color: Color::rgb(0x25, 0x63, 0xeb),
            foreground_color: Color::WHITE,
            text: None,
            source_image: None,
            text_size_fraction: 0.5,
        }
    }
}

impl SynthesisSpec {
    /// Same spec at a different pixel size.
    pub fn at_size(&self, size_px: u32) -> Self {
        Self {
            size_px,
            ..self.clone()
        }
    }
}

/// Allocation ceiling for a single [`RasterSurface`](super::surface::RasterSurface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLimits {
    pub max_pixels: u64,
    pub max_side: u32,
}

impl Default for SurfaceLimits {
    fn default() -> Self {
        Self {
            max_pixels: 64_000_000,
            max_side: 16_384,
        }
    }
}

/// What the encoder should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub mime_type: String,
    pub quality: Quality,
    /// Encode PNG when the requested mime has no encoder, flagging the
    /// artifact instead of failing.
    pub allow_png_fallback: bool,
}

impl EncodeRequest {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            quality: Quality::default(),
            allow_png_fallback: false,
        }
    }

    pub fn png() -> Self {
        Self::new(OutputFormat::Png.mime())
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}
