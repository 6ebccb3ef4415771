//! Embed snippet and web manifest for an exported icon set.
//!
//! Pure text generation with no dependency on the raster side: given the
//! selected sizes and a display name it produces
//!
//! - an HTML snippet, one `<link>` per line: the `favicon.ico` "any" entry,
//!   one PNG entry per size in the order given, the 180px apple-touch icon and
//!   the manifest link (`sizes.len() + 3` lines in total);
//! - a pretty-printed `site.webmanifest` JSON document with one icon object
//!   per size.
//!
//! Markup goes through `maud`, so names and paths are always escaped.

use crate::imaging::{Color, OutputFormat};
use crate::naming::{self, APPLE_TOUCH_ICON, FAVICON_ICO, WEB_MANIFEST};
use crate::presets::APPLE_TOUCH_ICON_SIZE;
use maud::html;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// `short_name` is cut to this many characters.
pub const SHORT_NAME_MAX_CHARS: usize = 12;

/// Used when the display name is blank.
pub const DEFAULT_APP_NAME: &str = "App";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorBundle {
    pub embed_snippet: String,
    pub manifest_json: String,
}

/// Manifest fields that are not derived from the icon set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub theme_color: Color,
    pub background_color: Color,
    pub display: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            theme_color: Color::WHITE,
            background_color: Color::WHITE,
            display: "standalone".to_string(),
        }
    }
}

/// Descriptors for a PNG icon set.
pub fn emit(sizes: &[u32], display_name: &str, manifest: &ManifestConfig) -> DescriptorBundle {
    emit_for_format(sizes, display_name, OutputFormat::Png, manifest)
}

/// Descriptors for an icon set exported as `format`.
pub fn emit_for_format(
    sizes: &[u32],
    display_name: &str,
    format: OutputFormat,
    manifest: &ManifestConfig,
) -> DescriptorBundle {
    DescriptorBundle {
        embed_snippet: embed_snippet(sizes, format),
        manifest_json: manifest_json(sizes, display_name, format, manifest),
    }
}

fn embed_snippet(sizes: &[u32], format: OutputFormat) -> String {
    let mut lines = Vec::with_capacity(sizes.len() + 3);

    lines.push(html! {
        link rel="icon" href={ "/" (FAVICON_ICO) } sizes="any";
    });
    for &size in sizes {
        lines.push(html! {
            link rel="icon" type=(format.mime()) sizes={ (size) "x" (size) }
                href={ "/" (naming::favicon_name(size, format.extension())) };
        });
    }
    lines.push(html! {
        link rel="apple-touch-icon" sizes={ (APPLE_TOUCH_ICON_SIZE) "x" (APPLE_TOUCH_ICON_SIZE) }
            href={ "/" (APPLE_TOUCH_ICON) };
    });
    lines.push(html! {
        link rel="manifest" href={ "/" (WEB_MANIFEST) };
    });

    lines
        .into_iter()
        .map(|markup| markup.into_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display name with surrounding whitespace removed, or [`DEFAULT_APP_NAME`].
pub fn app_name(display_name: &str) -> &str {
    match display_name.trim() {
        "" => DEFAULT_APP_NAME,
        name => name,
    }
}

pub fn short_name(display_name: &str) -> String {
    app_name(display_name)
        .chars()
        .take(SHORT_NAME_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn manifest_json(
    sizes: &[u32],
    display_name: &str,
    format: OutputFormat,
    manifest: &ManifestConfig,
) -> String {
    let icons: Vec<_> = sizes
        .iter()
        .map(|&size| {
            json!({
                "src": format!("/{}", naming::favicon_name(size, format.extension())),
                "sizes": format!("{size}x{size}"),
                "type": format.mime(),
            })
        })
        .collect();

    let doc = json!({
        "name": app_name(display_name),
        "short_name": short_name(display_name),
        "icons": icons,
        "theme_color": manifest.theme_color.to_string(),
        "background_color": manifest.background_color.to_string(),
        "display": manifest.display,
    });
    format!("{doc:#}")
}
