//! Tool configuration module.
//!
//! Handles loading, validating, and merging `rastersmith.toml` files. Stock
//! defaults are the base layer; a user file overrides any subset of them.
//!
//! ## Config File Location
//!
//! `--config FILE` names the file explicitly (it must exist). Without it,
//! `rastersmith.toml` in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "png"            # png, jpeg, webp, avif (or a mime type)
//! quality = 90              # 0-100, JPEG and AVIF only
//! allow_png_fallback = false
//! dir = "."
//!
//! [limits]
//! max_pixels = 64000000     # Largest surface, in pixels
//! max_side = 16384          # Largest surface side, in pixels
//!
//! [icon]
//! size = 512
//! shape = "rounded"         # square, rounded, circle
//! background = "#2563eb"
//! foreground = "#ffffff"
//! text_size = 0.5           # Glyph height as a fraction of the icon size
//!
//! [favicon]
//! sizes = [16, 32, 48, 192, 512]
//! name = "App"
//!
//! [manifest]
//! theme_color = "#ffffff"
//! background_color = "#ffffff"
//! display = "standalone"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [presets]
//! newsletter-hero = [600, 300]
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [icon]
//! shape = "circle"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::descriptor::ManifestConfig;
use crate::imaging::{
    Color, EncodeRequest, OutputFormat, Quality, Shape, SurfaceLimits, SynthesisSpec,
};
use crate::presets::{DEFAULT_FAVICON_SELECTION, PresetCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "rastersmith.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `rastersmith.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Encoding and output location.
    pub output: OutputConfig,
    /// Surface allocation ceiling.
    pub limits: LimitsConfig,
    /// Icon appearance defaults.
    pub icon: IconConfig,
    /// Favicon set defaults.
    pub favicon: FaviconConfig,
    /// Web manifest fields not derived from the icons.
    pub manifest: ManifestConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Extra resize presets, `name = [width, height]`.
    pub presets: BTreeMap<String, [u32; 2]>,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 0-100".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::Validation(format!(
                "output.format '{}' is not one of png, jpeg, webp, avif",
                self.output.format
            )));
        }
        if self.limits.max_pixels == 0 || self.limits.max_side == 0 {
            return Err(ConfigError::Validation(
                "limits values must be non-zero".into(),
            ));
        }
        if self.icon.size == 0 {
            return Err(ConfigError::Validation("icon.size must be non-zero".into()));
        }
        let text_size = self.icon.text_size;
        if !text_size.is_finite() || text_size <= 0.0 || text_size > 1.0 {
            return Err(ConfigError::Validation(
                "icon.text_size must be in (0, 1]".into(),
            ));
        }
        if self.favicon.sizes.is_empty() || self.favicon.sizes.contains(&0) {
            return Err(ConfigError::Validation(
                "favicon.sizes must be a non-empty list of non-zero sizes".into(),
            ));
        }
        if self.manifest.display.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest.display must not be empty".into(),
            ));
        }
        if let Some((name, _)) = self
            .presets
            .iter()
            .find(|(_, [w, h])| *w == 0 || *h == 0)
        {
            return Err(ConfigError::Validation(format!(
                "presets.{name} dimensions must be non-zero"
            )));
        }
        Ok(())
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.output.format).unwrap_or(OutputFormat::Png)
    }

    pub fn encode_request(&self) -> EncodeRequest {
        EncodeRequest {
            mime_type: self.output_format().mime().to_string(),
            quality: Quality::new(self.output.quality),
            allow_png_fallback: self.output.allow_png_fallback,
        }
    }

    pub fn surface_limits(&self) -> SurfaceLimits {
        SurfaceLimits {
            max_pixels: self.limits.max_pixels,
            max_side: self.limits.max_side,
        }
    }

    pub fn catalog(&self) -> PresetCatalog {
        PresetCatalog::with_extra(&self.presets)
    }

    /// Icon template from the `[icon]` section, with no text or image yet.
    pub fn synthesis_spec(&self) -> SynthesisSpec {
        SynthesisSpec {
            size_px: self.icon.size,
            shape: self.icon.shape,
            background_color: self.icon.background,
            foreground_color: self.icon.foreground,
            text: None,
            source_image: None,
            text_size_fraction: self.icon.text_size,
        }
    }
}

/// Encoding and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format as an extension or mime type.
    pub format: String,
    /// Encoding quality (0 = worst, 100 = best). Only JPEG and AVIF use it.
    pub quality: u32,
    /// Write PNG (and say so) when the requested format cannot be produced.
    pub allow_png_fallback: bool,
    /// Default directory for written files.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            quality: 90,
            allow_png_fallback: false,
            dir: PathBuf::from("."),
        }
    }
}

/// Surface allocation ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_pixels: u64,
    pub max_side: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = SurfaceLimits::default();
        Self {
            max_pixels: limits.max_pixels,
            max_side: limits.max_side,
        }
    }
}

/// Icon appearance defaults; command-line flags override them per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconConfig {
    pub size: u32,
    pub shape: Shape,
    pub background: Color,
    pub foreground: Color,
    pub text_size: f32,
}

impl Default for IconConfig {
    fn default() -> Self {
        let spec = SynthesisSpec::default();
        Self {
            size: spec.size_px,
            shape: spec.shape,
            background: spec.background_color,
            foreground: spec.foreground_color,
            text_size: spec.text_size_fraction,
        }
    }
}

/// Favicon set defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconConfig {
    /// Sizes exported when `--sizes` is not given.
    pub sizes: Vec<u32>,
    /// Display name for the manifest.
    pub name: String,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_FAVICON_SELECTION.to_vec(),
            name: crate::descriptor::DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel encode workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An `explicit` path must exist. Otherwise [`CONFIG_FILE_NAME`] in `dir` is
/// used if present, and stock defaults if not.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ToolConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(toml::from_str(&fs::read_to_string(path)?)?),
        None => load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    };
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `rastersmith.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Rastersmith Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass a file with --config, or put rastersmith.toml in the working directory.
# Only the keys you want to override are needed.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Encoded format: png, jpeg, webp or avif (a mime type works too).
# WebP output is lossless.
format = "png"

# Encoding quality (0 = worst, 100 = best). Used by JPEG and AVIF only.
quality = 90

# When the requested format cannot be produced, write PNG instead and
# report the substitution. When false, the export fails.
allow_png_fallback = false

# Directory files are written to.
dir = "."

# ---------------------------------------------------------------------------
# Surface limits
# ---------------------------------------------------------------------------
[limits]
# Largest surface the tool will allocate, in total pixels.
max_pixels = 64000000

# Largest surface side, in pixels.
max_side = 16384

# ---------------------------------------------------------------------------
# Icon appearance
# ---------------------------------------------------------------------------
[icon]
# Edge length of a single icon, in pixels.
size = 512

# Background shape: square, rounded or circle.
shape = "rounded"

# Colors as #rgb, #rrggbb, #rrggbbaa or "transparent".
background = "#2563eb"
foreground = "#ffffff"

# Text glyph height as a fraction of the icon size, in (0, 1].
text_size = 0.5

# ---------------------------------------------------------------------------
# Favicon set
# ---------------------------------------------------------------------------
[favicon]
# Sizes exported by `favicons` when --sizes is not given.
sizes = [16, 32, 48, 192, 512]

# Display name written to the web manifest.
name = "App"

# ---------------------------------------------------------------------------
# Web manifest
# ---------------------------------------------------------------------------
[manifest]
theme_color = "#ffffff"
background_color = "#ffffff"
display = "standalone"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Extra resize presets
# ---------------------------------------------------------------------------
[presets]
# name = [width, height]. A built-in name overrides that preset.
# newsletter-hero = [600, 300]
"##
}
