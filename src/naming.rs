//! Output filename patterns.
//!
//! | Artifact | Pattern |
//! |---|---|
//! | Resized image | `{basename}-{width}x{height}.{ext}` |
//! | Favicon PNG / WebP / … | `favicon-{size}x{size}.{ext}` |
//! | Apple touch icon | `apple-touch-icon.png` |
//! | ICO bundle | `favicon.ico` |
//! | Web manifest | `site.webmanifest` |
//! | Embed snippet | `favicon-snippet.html` |
//!
//! The snippet and manifest reference the same names, so everything here is
//! the single source for them.

use std::path::Path;

pub const APPLE_TOUCH_ICON: &str = "apple-touch-icon.png";
pub const FAVICON_ICO: &str = "favicon.ico";
pub const WEB_MANIFEST: &str = "site.webmanifest";
pub const SNIPPET_FILE: &str = "favicon-snippet.html";

/// Basename used when the input path has no usable stem.
pub const FALLBACK_BASENAME: &str = "image";

/// File stem of `input`, made safe to use as a download name.
///
/// Only the last path component is used. Any remaining path separators are
/// replaced by `_`, and a blank stem becomes [`FALLBACK_BASENAME`].
pub fn basename(input: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_BASENAME);
    stem.chars()
        .map(|ch| if ch == '/' || ch == '\\' { '_' } else { ch })
        .collect()
}

/// `{basename}-{width}x{height}.{ext}`
pub fn download_name(input: &str, width: u32, height: u32, ext: &str) -> String {
    format!("{}-{width}x{height}.{ext}", basename(input))
}

/// `favicon-{size}x{size}.{ext}`
pub fn favicon_name(size: u32, ext: &str) -> String {
    format!("favicon-{size}x{size}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_uses_stem_and_dimensions() {
        assert_eq!(
            download_name("/photos/beach.jpeg", 800, 600, "webp"),
            "beach-800x600.webp"
        );
    }

    #[test]
    fn download_name_keeps_inner_dots() {
        assert_eq!(
            download_name("team.offsite.png", 10, 20, "png"),
            "team.offsite-10x20.png"
        );
    }

    #[test]
    fn blank_stem_falls_back() {
        assert_eq!(basename(""), "image");
        assert_eq!(basename("/tmp/"), "tmp");
        assert_eq!(basename("   .png"), "image");
    }

    #[test]
    fn backslashes_are_replaced() {
        // Not a separator on unix, so it survives into the stem.
        assert_eq!(basename("a\\b.png"), "a_b");
    }

    #[test]
    fn favicon_name_pattern() {
        assert_eq!(favicon_name(32, "png"), "favicon-32x32.png");
        assert_eq!(favicon_name(512, "webp"), "favicon-512x512.webp");
    }
}
