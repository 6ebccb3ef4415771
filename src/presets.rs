//! Static lookup tables: named resize boxes and named icon size sets.
//!
//! The built-in tables cover the common social-media canvases and favicon
//! resolutions. Sites can add or override presets through the `[presets]`
//! config table; that is a configuration change, not a pipeline change.

use std::collections::BTreeMap;

/// A named target box for the resize tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

const BUILTIN_PRESETS: &[(&str, &str, u32, u32)] = &[
    ("instagram-post", "Instagram post", 1080, 1080),
    ("instagram-portrait", "Instagram portrait", 1080, 1350),
    ("instagram-story", "Instagram story", 1080, 1920),
    ("facebook-post", "Facebook post", 1200, 630),
    ("facebook-cover", "Facebook cover", 820, 312),
    ("twitter-post", "X / Twitter post", 1600, 900),
    ("twitter-header", "X / Twitter header", 1500, 500),
    ("linkedin-post", "LinkedIn post", 1200, 627),
    ("linkedin-banner", "LinkedIn banner", 1584, 396),
    ("youtube-thumbnail", "YouTube thumbnail", 1280, 720),
    ("pinterest-pin", "Pinterest pin", 1000, 1500),
    ("open-graph", "Open Graph image", 1200, 630),
];

/// Every resolution the favicon tool offers, ascending.
pub const FAVICON_SIZES: &[u32] = &[16, 32, 48, 64, 128, 180, 192, 256, 512];

/// Sizes pre-selected when the user has not picked any.
pub const DEFAULT_FAVICON_SELECTION: &[u32] = &[16, 32, 48, 192, 512];

/// Fixed size of the apple-touch icon referenced by the embed snippet.
pub const APPLE_TOUCH_ICON_SIZE: u32 = 180;

const SIZE_SETS: &[(&str, &[u32])] = &[
    ("favicon", &[16, 32, 48]),
    ("pwa", &[192, 512]),
    ("apple", &[APPLE_TOUCH_ICON_SIZE]),
    ("standard", DEFAULT_FAVICON_SELECTION),
    ("all", FAVICON_SIZES),
];

/// Look up a named icon size set.
pub fn size_set(name: &str) -> Option<&'static [u32]> {
    SIZE_SETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, sizes)| *sizes)
}

/// Names and contents of all icon size sets, in display order.
pub fn size_sets() -> &'static [(&'static str, &'static [u32])] {
    SIZE_SETS
}

/// Ordered, read-only catalog of resize presets.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: BUILTIN_PRESETS
                .iter()
                .map(|&(name, label, width, height)| Preset {
                    name: name.to_string(),
                    label: label.to_string(),
                    width,
                    height,
                })
                .collect(),
        }
    }

    /// Built-in presets plus `extra` entries (`name → [width, height]`).
    ///
    /// An extra entry with a built-in name replaces that preset in place;
    /// new names are appended in key order.
    pub fn with_extra(extra: &BTreeMap<String, [u32; 2]>) -> Self {
        let mut catalog = Self::builtin();
        for (name, &[width, height]) in extra {
            match catalog
                .presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(name))
            {
                Some(existing) => {
                    existing.width = width;
                    existing.height = height;
                }
                None => catalog.presets.push(Preset {
                    name: name.clone(),
                    label: name.replace('-', " "),
                    width,
                    height,
                }),
            }
        }
        catalog
    }

    /// Case-insensitive lookup by name.
    pub fn get(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let catalog = PresetCatalog::builtin();
        let preset = catalog.get("Instagram-Post").unwrap();
        assert_eq!((preset.width, preset.height), (1080, 1080));
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(PresetCatalog::builtin().get("myspace-banner").is_none());
    }

    #[test]
    fn builtin_presets_are_positive_and_unique() {
        let catalog = PresetCatalog::builtin();
        let mut names: Vec<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert!(catalog.iter().all(|p| p.width > 0 && p.height > 0));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn extra_presets_override_and_append() {
        let mut extra = BTreeMap::new();
        extra.insert("facebook-post".to_string(), [1200, 628]);
        extra.insert("newsletter-hero".to_string(), [600, 300]);
        let catalog = PresetCatalog::with_extra(&extra);

        assert_eq!(catalog.get("facebook-post").unwrap().height, 628);
        assert_eq!(catalog.len(), PresetCatalog::builtin().len() + 1);
        let added = catalog.get("newsletter-hero").unwrap();
        assert_eq!(added.label, "newsletter hero");
        assert_eq!(catalog.iter().last().unwrap().name, "newsletter-hero");
    }

    #[test]
    fn size_sets_resolve_by_name() {
        assert_eq!(size_set("favicon"), Some(&[16, 32, 48][..]));
        assert_eq!(size_set("PWA"), Some(&[192, 512][..]));
        assert_eq!(size_set("apple"), Some(&[180][..]));
        assert!(size_set("nope").is_none());
    }

    #[test]
    fn default_selection_is_subset_of_offered_sizes() {
        assert!(
            DEFAULT_FAVICON_SELECTION
                .iter()
                .all(|s| FAVICON_SIZES.contains(s))
        );
    }
}
