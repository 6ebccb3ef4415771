//! Multi-size icon export.
//!
//! [`export_all`] validates the template and decodes its source image once,
//! then renders and encodes every selected size in parallel on the rayon
//! pool. Sizes are independent: one failing encode becomes an
//! [`ExportFailure`] and the rest carry on. Only template problems (bad spec,
//! undecodable source) fail the whole call.
//!
//! Results come back in [`SizeSet`] order regardless of which worker finished
//! first. Progress can be streamed as [`BatchEvent`]s over an mpsc channel to
//! a printer thread, the same way the CLI prints while work is running.
//!
//! [`FaviconBundle`] builds on top of this: the icon set plus the fixed
//! apple-touch icon, a packed `favicon.ico` and the descriptors.

use crate::descriptor::{self, DescriptorBundle, ManifestConfig};
use crate::imaging::ico::{MAX_ICO_SIDE, pack_ico};
use crate::imaging::{
    EncodeFailureReason, EncodeRequest, IconSynthesizer, ImageBackend, OutputArtifact,
    OutputFormat, PipelineError, SurfaceLimits, SynthesisSpec, encode,
};
use crate::naming::{self, APPLE_TOUCH_ICON, FAVICON_ICO, SNIPPET_FILE, WEB_MANIFEST};
use crate::presets::APPLE_TOUCH_ICON_SIZE;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Size rendered for `favicon.ico` when no exported PNG fits.
const ICO_FALLBACK_SIZE: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEntry {
    pub size: u32,
    pub selected: bool,
}

/// Ordered list of offered sizes and whether each is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSet {
    entries: Vec<SizeEntry>,
}

impl SizeSet {
    pub fn new(entries: Vec<SizeEntry>) -> Self {
        Self { entries }
    }

    /// Every size selected, in the given order.
    pub fn selected(sizes: &[u32]) -> Self {
        Self::new(
            sizes
                .iter()
                .map(|&size| SizeEntry {
                    size,
                    selected: true,
                })
                .collect(),
        )
    }

    /// `offered` in order, marking the ones that appear in `selection`.
    pub fn from_offered(offered: &[u32], selection: &[u32]) -> Self {
        Self::new(
            offered
                .iter()
                .map(|&size| SizeEntry {
                    size,
                    selected: selection.contains(&size),
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[SizeEntry] {
        &self.entries
    }

    /// Selected sizes in order; a repeated size is kept at its first position.
    pub fn selected_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter().filter(|e| e.selected) {
            if !sizes.contains(&entry.size) {
                sizes.push(entry.size);
            }
        }
        sizes
    }
}

/// Per-call encode settings for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub request: EncodeRequest,
    pub limits: SurfaceLimits,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            request: EncodeRequest::png(),
            limits: SurfaceLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedIcon {
    pub size: u32,
    pub artifact: OutputArtifact,
}

#[derive(Debug)]
pub struct ExportFailure {
    pub size: u32,
    pub error: PipelineError,
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub artifacts: Vec<ExportedIcon>,
    pub failures: Vec<ExportFailure>,
}

impl BatchResult {
    pub fn artifact(&self, size: u32) -> Option<&OutputArtifact> {
        self.artifacts
            .iter()
            .find(|icon| icon.size == size)
            .map(|icon| &icon.artifact)
    }

    pub fn failure(&self, size: u32) -> Option<&PipelineError> {
        self.failures
            .iter()
            .find(|f| f.size == size)
            .map(|f| &f.error)
    }

    /// The biggest successful icon, offered as the single quick download.
    pub fn largest(&self) -> Option<&ExportedIcon> {
        self.artifacts.iter().max_by_key(|icon| icon.size)
    }

    pub fn exported_sizes(&self) -> Vec<u32> {
        self.artifacts.iter().map(|icon| icon.size).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Distinct sizes attempted: exported plus failed.
    pub fn attempted(&self) -> usize {
        self.artifacts.len() + self.failures.len()
    }
}

/// Progress notifications from a running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started { total: usize },
    SizeExported { size: u32, mime_type: String, bytes: usize },
    SizeFailed { size: u32, message: String },
}

/// Render and encode every selected size of `template`.
pub fn export_all<B: ImageBackend + ?Sized>(
    backend: &B,
    template: &SynthesisSpec,
    sizes: &SizeSet,
    options: &ExportOptions,
    events: Option<&Sender<BatchEvent>>,
) -> Result<BatchResult, PipelineError> {
    let synth = IconSynthesizer::prepare(backend, template, options.limits)?;
    Ok(export_prepared(
        backend,
        &synth,
        &sizes.selected_sizes(),
        options,
        events,
    ))
}

fn export_prepared<B: ImageBackend + ?Sized>(
    backend: &B,
    synth: &IconSynthesizer,
    sizes: &[u32],
    options: &ExportOptions,
    events: Option<&Sender<BatchEvent>>,
) -> BatchResult {
    let notify = |event: BatchEvent| {
        if let Some(tx) = events {
            // A closed channel only means nobody is listening anymore.
            let _ = tx.send(event);
        }
    };
    notify(BatchEvent::Started { total: sizes.len() });

    let outcomes: Vec<(u32, Result<OutputArtifact, PipelineError>)> = sizes
        .par_iter()
        .map(|&size| {
            let result = synth
                .render(size)
                .and_then(|surface| encode(backend, &surface, &options.request));
            match &result {
                Ok(artifact) => {
                    tracing::info!(size, bytes = artifact.byte_length(), "exported icon");
                    notify(BatchEvent::SizeExported {
                        size,
                        mime_type: artifact.mime_type().to_string(),
                        bytes: artifact.byte_length(),
                    });
                }
                Err(e) => {
                    tracing::warn!(size, error = %e, "icon export failed");
                    notify(BatchEvent::SizeFailed {
                        size,
                        message: e.to_string(),
                    });
                }
            }
            (size, result)
        })
        .collect();

    let mut batch = BatchResult::default();
    for (size, outcome) in outcomes {
        match outcome {
            Ok(artifact) => batch.artifacts.push(ExportedIcon { size, artifact }),
            Err(error) => batch.failures.push(ExportFailure { size, error }),
        }
    }
    batch
}

// ============================================================================
// Favicon bundle
// ============================================================================

/// Everything a site needs for its favicons.
#[derive(Debug)]
pub struct FaviconBundle {
    pub icons: BatchResult,
    pub apple_touch_icon: Option<OutputArtifact>,
    pub ico: Option<Vec<u8>>,
    pub descriptors: DescriptorBundle,
    /// Non-fatal problems with the fixed extras (apple-touch icon, ICO).
    pub warnings: Vec<String>,
    format: OutputFormat,
}

impl FaviconBundle {
    pub fn build<B: ImageBackend + ?Sized>(
        backend: &B,
        template: &SynthesisSpec,
        sizes: &SizeSet,
        options: &ExportOptions,
        display_name: &str,
        manifest: &ManifestConfig,
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<Self, PipelineError> {
        let format = OutputFormat::parse(&options.request.mime_type).ok_or_else(|| {
            PipelineError::EncodeFailure {
                requested: options.request.mime_type.clone(),
                reason: EncodeFailureReason::Unsupported,
            }
        })?;
        let synth = IconSynthesizer::prepare(backend, template, options.limits)?;
        let icons = export_prepared(backend, &synth, &sizes.selected_sizes(), options, events);

        let mut warnings = Vec::new();
        let png = EncodeRequest::png().with_quality(options.request.quality);
        let render_png = |size: u32| {
            synth
                .render(size)
                .and_then(|surface| encode(backend, &surface, &png))
        };

        let apple_touch_icon = match render_png(APPLE_TOUCH_ICON_SIZE) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::warn!(error = %e, "apple-touch icon failed");
                warnings.push(format!("{APPLE_TOUCH_ICON}: {e}"));
                None
            }
        };

        let fallback;
        let mut ico_sources: Vec<&OutputArtifact> = icons
            .artifacts
            .iter()
            .map(|icon| &icon.artifact)
            .filter(|a| {
                a.format() == Some(OutputFormat::Png)
                    && a.width() <= MAX_ICO_SIDE
                    && a.height() <= MAX_ICO_SIDE
            })
            .collect();
        if ico_sources.is_empty() {
            match render_png(ICO_FALLBACK_SIZE) {
                Ok(artifact) => {
                    fallback = artifact;
                    ico_sources.push(&fallback);
                }
                Err(e) => warnings.push(format!("{FAVICON_ICO}: {e}")),
            }
        }
        let ico = if ico_sources.is_empty() {
            None
        } else {
            match pack_ico(&ico_sources) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warnings.push(format!("{FAVICON_ICO}: {e}"));
                    None
                }
            }
        };

        let descriptors =
            descriptor::emit_for_format(&icons.exported_sizes(), display_name, format, manifest);

        Ok(Self {
            icons,
            apple_touch_icon,
            ico,
            descriptors,
            warnings,
            format,
        })
    }

    /// Format of the size-named icons.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write every produced file into `dir`, returning the paths written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        let mut write = |name: &str, bytes: &[u8]| -> std::io::Result<()> {
            let path = dir.join(name);
            std::fs::write(&path, bytes)?;
            written.push(path);
            Ok(())
        };

        for icon in &self.icons.artifacts {
            write(
                &naming::favicon_name(icon.size, self.format.extension()),
                icon.artifact.bytes(),
            )?;
        }
        if let Some(apple) = &self.apple_touch_icon {
            write(APPLE_TOUCH_ICON, apple.bytes())?;
        }
        if let Some(ico) = &self.ico {
            write(FAVICON_ICO, ico)?;
        }
        write(WEB_MANIFEST, self.descriptors.manifest_json.as_bytes())?;
        write(SNIPPET_FILE, self.descriptors.embed_snippet.as_bytes())?;

        tracing::info!(dir = %dir.display(), files = written.len(), "wrote favicon bundle");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::asset::tests::gradient_png;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{ErrorKind, ImageAsset, RustBackend, Shape};

    fn template() -> SynthesisSpec {
        SynthesisSpec {
            text: Some("RS".to_string()),
            shape: Shape::Circle,
            ..SynthesisSpec::default()
        }
    }

    // =========================================================================
    // SizeSet
    // =========================================================================

    #[test]
    fn selected_sizes_skip_unselected_and_duplicates() {
        let set = SizeSet::new(vec![
            SizeEntry { size: 32, selected: true },
            SizeEntry { size: 16, selected: false },
            SizeEntry { size: 48, selected: true },
            SizeEntry { size: 32, selected: true },
        ]);
        assert_eq!(set.selected_sizes(), vec![32, 48]);
    }

    #[test]
    fn from_offered_marks_selection() {
        let set = SizeSet::from_offered(&[16, 32, 48, 64], &[48, 16]);
        assert_eq!(set.entries().len(), 4);
        assert_eq!(set.selected_sizes(), vec![16, 48]);
    }

    // =========================================================================
    // export_all
    // =========================================================================

    #[test]
    fn exports_exactly_the_selected_sizes() {
        let result = export_all(
            &RustBackend::new(),
            &template(),
            &SizeSet::selected(&[16, 32, 48]),
            &ExportOptions::default(),
            None,
        )
        .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.artifacts.len(), 3);
        for icon in &result.artifacts {
            assert_eq!(icon.artifact.width(), icon.size);
            assert_eq!(icon.artifact.height(), icon.size);
        }
        assert_eq!(result.exported_sizes(), vec![16, 32, 48]);
    }

    #[test]
    fn one_failing_size_does_not_sink_the_batch() {
        let backend = MockBackend::failing_on(&[32]);
        let result = export_all(
            &backend,
            &template(),
            &SizeSet::selected(&[16, 32, 48, 64]),
            &ExportOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(result.artifacts.len(), 3);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(
            result.failure(32).map(PipelineError::kind),
            Some(ErrorKind::EncodeFailure)
        );
        assert!(result.artifact(32).is_none());
        assert!(!result.is_complete());
        assert_eq!(result.exported_sizes(), vec![16, 48, 64]);
    }

    #[test]
    fn duplicate_sizes_count_once_when_one_fails() {
        let result = export_all(
            &MockBackend::failing_on(&[32]),
            &template(),
            &SizeSet::selected(&[16, 32, 16, 32, 48]),
            &ExportOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(result.attempted(), 3);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.exported_sizes(), vec![16, 48]);
    }

    #[test]
    fn output_order_follows_the_size_set() {
        let result = export_all(
            &MockBackend::new(),
            &template(),
            &SizeSet::selected(&[512, 16, 128, 32]),
            &ExportOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(result.exported_sizes(), vec![512, 16, 128, 32]);
        assert_eq!(result.largest().unwrap().size, 512);
    }

    #[test]
    fn invalid_template_fails_the_whole_batch() {
        let backend = MockBackend::new();
        let bad = SynthesisSpec {
            text_size_fraction: 2.0,
            ..template()
        };
        let err = export_all(
            &backend,
            &bad,
            &SizeSet::selected(&[16]),
            &ExportOptions::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn oversized_entry_is_a_per_size_failure() {
        let options = ExportOptions {
            limits: SurfaceLimits {
                max_pixels: 10_000,
                max_side: 100,
            },
            ..ExportOptions::default()
        };
        let result = export_all(
            &MockBackend::new(),
            &template(),
            &SizeSet::selected(&[16, 512]),
            &options,
            None,
        )
        .unwrap();
        assert_eq!(result.exported_sizes(), vec![16]);
        assert_eq!(
            result.failure(512).map(PipelineError::kind),
            Some(ErrorKind::ResourceExhausted)
        );
    }

    #[test]
    fn source_image_is_decoded_once_per_batch() {
        let backend = MockBackend::new();
        let spec = SynthesisSpec {
            source_image: Some(ImageAsset::from_bytes(gradient_png(20, 20), None).unwrap()),
            ..template()
        };
        export_all(
            &backend,
            &spec,
            &SizeSet::selected(&[16, 32, 48]),
            &ExportOptions::default(),
            None,
        )
        .unwrap();
        let decodes = backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, crate::imaging::backend::tests::RecordedOp::Decode { .. }))
            .count();
        assert_eq!(decodes, 1);
        assert_eq!(backend.encoded_widths().len(), 3);
    }

    #[test]
    fn events_report_progress() {
        let (tx, rx) = std::sync::mpsc::channel();
        export_all(
            &MockBackend::failing_on(&[16]),
            &template(),
            &SizeSet::selected(&[16, 32]),
            &ExportOptions::default(),
            Some(&tx),
        )
        .unwrap();
        drop(tx);

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events[0], BatchEvent::Started { total: 2 });
        assert_eq!(events.len(), 3);
        assert!(events.iter().any(|e| matches!(e, BatchEvent::SizeFailed { size: 16, .. })));
        assert!(events.iter().any(|e| matches!(e, BatchEvent::SizeExported { size: 32, .. })));
    }

    // =========================================================================
    // FaviconBundle
    // =========================================================================

    fn bundle(sizes: &[u32], options: &ExportOptions) -> FaviconBundle {
        FaviconBundle::build(
            &RustBackend::new(),
            &template(),
            &SizeSet::selected(sizes),
            options,
            "Rastersmith Demo Site",
            &ManifestConfig::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn bundle_has_apple_icon_ico_and_descriptors() {
        let b = bundle(&[16, 32], &ExportOptions::default());
        let apple = b.apple_touch_icon.as_ref().unwrap();
        assert_eq!((apple.width(), apple.height()), (180, 180));

        let ico = b.ico.as_ref().unwrap();
        assert_eq!(u16::from_le_bytes([ico[4], ico[5]]), 2);

        assert_eq!(b.descriptors.embed_snippet.lines().count(), 5);
        assert!(b.descriptors.manifest_json.contains("\"short_name\": \"Rastersmith\""));
        assert!(b.warnings.is_empty());
    }

    #[test]
    fn ico_falls_back_to_small_render() {
        let b = bundle(&[512], &ExportOptions::default());
        let ico = b.ico.as_ref().unwrap();
        assert_eq!(u16::from_le_bytes([ico[4], ico[5]]), 1);
        assert_eq!(ico[6], 32);
    }

    #[test]
    fn webp_bundle_uses_webp_names_and_png_ico() {
        let options = ExportOptions {
            request: EncodeRequest::new("image/webp"),
            ..ExportOptions::default()
        };
        let b = bundle(&[48], &options);
        assert_eq!(b.icons.artifact(48).unwrap().mime_type(), "image/webp");
        assert!(b.ico.is_some());
        assert!(b.descriptors.embed_snippet.contains("favicon-48x48.webp"));
    }

    #[test]
    fn write_to_creates_every_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("icons");
        let b = bundle(&[16, 192], &ExportOptions::default());
        let written = b.write_to(&out).unwrap();

        for name in [
            "favicon-16x16.png",
            "favicon-192x192.png",
            "apple-touch-icon.png",
            "favicon.ico",
            "site.webmanifest",
            "favicon-snippet.html",
        ] {
            assert!(out.join(name).is_file(), "missing {name}");
        }
        assert_eq!(written.len(), 6);

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("site.webmanifest")).unwrap())
                .unwrap();
        assert_eq!(manifest["icons"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_bundle_format_is_rejected_up_front() {
        let options = ExportOptions {
            request: EncodeRequest::new("image/gif"),
            ..ExportOptions::default()
        };
        let err = FaviconBundle::build(
            &MockBackend::new(),
            &template(),
            &SizeSet::selected(&[16]),
            &options,
            "App",
            &ManifestConfig::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeFailure);
    }
}
