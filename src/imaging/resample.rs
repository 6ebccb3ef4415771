//! Resize tool: plan → decode → allocate → draw scaled → encode.
//!
//! [`resample`] stops after drawing and hands back the surface, so a caller
//! can run the encode in the background. [`resize`] is the synchronous
//! end-to-end version.

use super::asset::ImageAsset;
use super::backend::ImageBackend;
use super::calculations::{TargetDimensions, plan};
use super::encoder::{OutputArtifact, encode};
use super::error::PipelineError;
use super::params::{EncodeRequest, ResizeIntent, SurfaceLimits};
use super::surface::RasterSurface;
use crate::presets::PresetCatalog;

/// Draw `asset` stretched onto a new surface of exactly `target` size.
///
/// The source is decoded before the surface is allocated, so a bad source
/// never costs a target-sized buffer.
pub fn resample<B: ImageBackend + ?Sized>(
    backend: &B,
    asset: &ImageAsset,
    target: TargetDimensions,
    limits: &SurfaceLimits,
) -> Result<RasterSurface, PipelineError> {
    let decoded = backend.decode(asset)?;
    let mut surface = RasterSurface::for_target(target, limits)?;
    surface.draw_image_scaled(&decoded);
    tracing::debug!(
        from_width = asset.width(),
        from_height = asset.height(),
        to_width = target.width,
        to_height = target.height,
        "resampled"
    );
    Ok(surface)
}

/// Plan the target for `intent` and resample to it.
pub fn plan_and_resample<B: ImageBackend + ?Sized>(
    backend: &B,
    asset: &ImageAsset,
    intent: &ResizeIntent,
    catalog: &PresetCatalog,
    limits: &SurfaceLimits,
) -> Result<RasterSurface, PipelineError> {
    let target = plan(asset.dimensions(), intent, catalog)?;
    resample(backend, asset, target, limits)
}

/// Full synchronous resize.
pub fn resize<B: ImageBackend + ?Sized>(
    backend: &B,
    asset: &ImageAsset,
    intent: &ResizeIntent,
    catalog: &PresetCatalog,
    limits: &SurfaceLimits,
    request: &EncodeRequest,
) -> Result<OutputArtifact, PipelineError> {
    let surface = plan_and_resample(backend, asset, intent, catalog, limits)?;
    encode(backend, &surface, request)
}
