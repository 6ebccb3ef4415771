//! CLI output formatting for every command.
//!
//! # Result-First Display
//!
//! Each command leads with what was produced (dimensions, format, file name)
//! and shows sizes and warnings as indented context lines beneath it:
//!
//! ## Resize / Icon
//!
//! ```text
//! beach.jpeg (4000x3000) → beach-800x600.webp
//!     Size: 800x600
//!     Format: image/webp (41.2 KB)
//! ```
//!
//! ## Favicons
//!
//! ```text
//! Exporting 5 sizes
//!     16x16: image/png (0.4 KB)
//!     32x32: image/png (0.9 KB)
//!     48x48: failed: ...
//!
//! Wrote 8 files → public/
//!     favicon-16x16.png
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, FaviconBundle};
use crate::imaging::{ImageAsset, OutputArtifact};
use crate::presets::{self, PresetCatalog};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: bytes below 1 KiB, KB with one decimal above.
fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Size, format and fallback lines shared by resize and icon output.
fn artifact_lines(artifact: &OutputArtifact) -> Vec<String> {
    let mut lines = vec![
        format!("{}Size: {}x{}", indent(1), artifact.width(), artifact.height()),
        format!(
            "{}Format: {} ({})",
            indent(1),
            artifact.mime_type(),
            format_bytes(artifact.byte_length())
        ),
    ];
    if let Some(requested) = artifact.substituted_from() {
        lines.push(format!(
            "{}Substituted: {} was not available, wrote {}",
            indent(1),
            requested,
            artifact.mime_type()
        ));
    }
    lines
}

// ============================================================================
// resize / icon
// ============================================================================

/// Format the result of a single resize.
pub fn format_resize_result(
    input: &Path,
    source: &ImageAsset,
    artifact: &OutputArtifact,
    written: &Path,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}x{}) → {}",
        file_name(input),
        source.width(),
        source.height(),
        file_name(written)
    )];
    lines.extend(artifact_lines(artifact));
    lines
}

pub fn print_resize_result(
    input: &Path,
    source: &ImageAsset,
    artifact: &OutputArtifact,
    written: &Path,
) {
    for line in format_resize_result(input, source, artifact, written) {
        println!("{}", line);
    }
}

/// Format the result of a single icon synthesis.
pub fn format_icon_result(artifact: &OutputArtifact, written: &Path) -> Vec<String> {
    let mut lines = vec![format!("Icon → {}", written.display())];
    lines.extend(artifact_lines(artifact));
    lines
}

pub fn print_icon_result(artifact: &OutputArtifact, written: &Path) {
    for line in format_icon_result(artifact, written) {
        println!("{}", line);
    }
}

// ============================================================================
// favicons
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "size" } else { "sizes" };
            vec![format!("Exporting {} {}", total, noun)]
        }
        BatchEvent::SizeExported {
            size,
            mime_type,
            bytes,
        } => vec![format!(
            "{}{}x{}: {} ({})",
            indent(1),
            size,
            size,
            mime_type,
            format_bytes(*bytes)
        )],
        BatchEvent::SizeFailed { size, message } => {
            vec![format!("{}{}x{}: failed: {}", indent(1), size, size, message)]
        }
    }
}

/// Format the summary printed after a favicon bundle is written.
///
/// Files are listed relative to `dir`, followed by per-size failures and
/// bundle warnings.
pub fn format_favicon_summary(
    bundle: &FaviconBundle,
    written: &[PathBuf],
    dir: &Path,
) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("Wrote {} files → {}", written.len(), dir.display()),
    ];
    for path in written {
        let shown = path.strip_prefix(dir).unwrap_or(path);
        lines.push(format!("{}{}", indent(1), shown.display()));
    }

    if !bundle.icons.failures.is_empty() {
        lines.push(format!("Failed sizes: {}", bundle.icons.failures.len()));
        for failure in &bundle.icons.failures {
            lines.push(format!(
                "{}{}x{}: {}",
                indent(1),
                failure.size,
                failure.size,
                failure.error
            ));
        }
    }
    for warning in &bundle.warnings {
        lines.push(format!("Warning: {}", warning));
    }
    lines
}

pub fn print_favicon_summary(bundle: &FaviconBundle, written: &[PathBuf], dir: &Path) {
    for line in format_favicon_summary(bundle, written, dir) {
        println!("{}", line);
    }
}

// ============================================================================
// presets
// ============================================================================

/// Format the preset catalog and the favicon size sets.
///
/// ```text
/// Presets
///     instagram-post  1080x1080  Instagram post
///
/// Favicon size sets
///     favicon  16, 32, 48
/// ```
pub fn format_presets(catalog: &PresetCatalog) -> Vec<String> {
    let mut lines = vec!["Presets".to_string()];
    let name_width = catalog.iter().map(|p| p.name.len()).max().unwrap_or(0);
    let dims: Vec<String> = catalog
        .iter()
        .map(|p| format!("{}x{}", p.width, p.height))
        .collect();
    let dims_width = dims.iter().map(String::len).max().unwrap_or(0);
    for (preset, dims) in catalog.iter().zip(&dims) {
        lines.push(format!(
            "{}{:<name_width$}  {:<dims_width$}  {}",
            indent(1),
            preset.name,
            dims,
            preset.label
        ));
    }

    lines.push(String::new());
    lines.push("Favicon size sets".to_string());
    let sets = presets::size_sets();
    let set_width = sets.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, sizes) in sets {
        let sizes = sizes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("{}{:<set_width$}  {}", indent(1), name, sizes));
    }
    lines
}

pub fn print_presets(catalog: &PresetCatalog) {
    for line in format_presets(catalog) {
        println!("{}", line);
    }
}
