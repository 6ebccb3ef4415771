//! Icon synthesis.
//!
//! An [`IconSynthesizer`] validates a [`SynthesisSpec`] and decodes its source
//! image once; after that it can render the icon at any number of sizes, from
//! any number of threads. Drawing order is background shape, then the
//! foreground (source image, else text), clipped to the same shape.

use super::backend::ImageBackend;
use super::error::PipelineError;
use super::params::{SurfaceLimits, SynthesisSpec};
use super::surface::RasterSurface;
use image::DynamicImage;

#[derive(Debug)]
pub struct IconSynthesizer {
    spec: SynthesisSpec,
    source: Option<DynamicImage>,
    limits: SurfaceLimits,
}

/// Reject specs that cannot produce an icon.
pub fn validate(spec: &SynthesisSpec) -> Result<(), PipelineError> {
    if spec.size_px == 0 {
        return Err(PipelineError::invalid("icon size must be positive"));
    }
    let fraction = spec.text_size_fraction;
    if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
        return Err(PipelineError::invalid(format!(
            "text size fraction must be in (0, 1], got {fraction}"
        )));
    }
    Ok(())
}

impl IconSynthesizer {
    pub fn prepare<B: ImageBackend + ?Sized>(
        backend: &B,
        spec: &SynthesisSpec,
        limits: SurfaceLimits,
    ) -> Result<Self, PipelineError> {
        validate(spec)?;
        let source = spec
            .source_image
            .as_ref()
            .map(|asset| backend.decode(asset))
            .transpose()?;
        Ok(Self {
            spec: spec.clone(),
            source,
            limits,
        })
    }

    pub fn spec(&self) -> &SynthesisSpec {
        &self.spec
    }

    /// Draw the icon at `size_px` × `size_px`.
    pub fn render(&self, size_px: u32) -> Result<RasterSurface, PipelineError> {
        let spec = &self.spec;
        let mut surface = RasterSurface::new(size_px, size_px, &self.limits)?;
        surface.fill_shape(spec.shape, spec.background_color);

        if let Some(source) = &self.source {
            surface.draw_image_cover(source, spec.shape);
        } else if let Some(text) = spec.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let glyph_height = size_px as f32 * spec.text_size_fraction;
            surface.draw_centered_text(text, glyph_height, spec.foreground_color, spec.shape);
        }
        Ok(surface)
    }

    /// Draw at the spec's own size.
    pub fn render_default(&self) -> Result<RasterSurface, PipelineError> {
        self.render(self.spec.size_px)
    }
}

/// One-shot synthesis at `spec.size_px`.
pub fn synthesize<B: ImageBackend + ?Sized>(
    backend: &B,
    spec: &SynthesisSpec,
    limits: SurfaceLimits,
) -> Result<RasterSurface, PipelineError> {
    IconSynthesizer::prepare(backend, spec, limits)?.render_default()
}
