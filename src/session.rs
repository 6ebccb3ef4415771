//! Interactive request state: latest-wins generations and a preview slot.
//!
//! A caller that re-renders on every option change ends up with several
//! encodes in flight. Each request takes a [`Ticket`] from the session's
//! [`GenerationCounter`]; when an encode settles, its result is only exposed
//! if its ticket is still the newest. Older results are dropped. Running
//! encodes are never aborted, only ignored.
//!
//! The exposed artifact lives in a [`PreviewSlot`], backed by a temporary
//! file that other tools can open by path. Exposing a new artifact deletes
//! the previous file first; so do [`reset`](ResizeSession::reset) and
//! dropping the session.

use crate::imaging::resample::plan_and_resample;
use crate::imaging::synth::synthesize;
use crate::imaging::{
    EncodeRequest, ImageAsset, ImageBackend, OutputArtifact, PendingEncode, PipelineError,
    RasterSurface, ResizeIntent, Settled, SurfaceLimits, SynthesisSpec, encode_in_background,
};
use crate::presets::PresetCatalog;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;

/// Identifies one request generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// `Some(value)` if `ticket` is still current, else `None`.
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }

    /// Supersede all outstanding tickets without issuing a new one.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// An exposed artifact and the temporary file holding its bytes.
#[derive(Debug)]
pub struct Preview {
    artifact: OutputArtifact,
    file: NamedTempFile,
}

impl Preview {
    pub fn artifact(&self) -> &OutputArtifact {
        &self.artifact
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Holds at most one [`Preview`]; the old one is released before a new one
/// is stored.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<Preview>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Preview> {
        self.current.as_ref()
    }

    pub fn replace(&mut self, artifact: OutputArtifact) -> Result<&Preview, PipelineError> {
        self.release();
        let ext = artifact.format().map_or("bin", |f| f.extension());
        let mut file = tempfile::Builder::new()
            .prefix("rastersmith-preview-")
            .suffix(&format!(".{ext}"))
            .tempfile()?;
        file.write_all(artifact.bytes())?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), "exposed preview");
        Ok(self.current.insert(Preview { artifact, file }))
    }

    pub fn release(&mut self) {
        if let Some(preview) = self.current.take() {
            let path = preview.file.path().to_path_buf();
            if let Err(e) = preview.file.close() {
                tracing::warn!(path = %path.display(), error = %e, "could not remove preview file");
            }
        }
    }
}

/// Shared request plumbing for the two interactive tools.
struct PreviewPipeline<B: ?Sized> {
    backend: Arc<B>,
    limits: SurfaceLimits,
    request: EncodeRequest,
    generations: GenerationCounter,
    preview: PreviewSlot,
}

impl<B: ImageBackend + ?Sized + 'static> PreviewPipeline<B> {
    fn new(backend: Arc<B>, limits: SurfaceLimits, request: EncodeRequest) -> Self {
        Self {
            backend,
            limits,
            request,
            generations: GenerationCounter::new(),
            preview: PreviewSlot::new(),
        }
    }

    fn dispatch(
        &self,
        ticket: Ticket,
        surface: Result<RasterSurface, PipelineError>,
    ) -> Result<(Ticket, PendingEncode), PipelineError> {
        let surface = surface?;
        let pending = encode_in_background(Arc::clone(&self.backend), surface, self.request.clone());
        Ok((ticket, pending))
    }

    fn complete(
        &mut self,
        ticket: Ticket,
        settled: Settled,
    ) -> Result<Option<&Preview>, PipelineError> {
        let Some(settled) = self.generations.accept(ticket, settled) else {
            tracing::debug!(?ticket, "dropping stale encode result");
            return Ok(None);
        };
        let artifact = settled.result?;
        self.preview.replace(artifact).map(Some)
    }

    fn reset(&mut self) {
        self.generations.invalidate();
        self.preview.release();
    }
}

/// Caller-owned state for the resize tool.
pub struct ResizeSession<B: ?Sized> {
    pipeline: PreviewPipeline<B>,
    catalog: PresetCatalog,
    source: Option<ImageAsset>,
}

impl<B: ImageBackend + ?Sized + 'static> ResizeSession<B> {
    pub fn new(
        backend: Arc<B>,
        catalog: PresetCatalog,
        limits: SurfaceLimits,
        request: EncodeRequest,
    ) -> Self {
        Self {
            pipeline: PreviewPipeline::new(backend, limits, request),
            catalog,
            source: None,
        }
    }

    /// Load a new source image. Outstanding requests for the old one go stale.
    pub fn set_source(&mut self, asset: ImageAsset) {
        self.pipeline.reset();
        self.source = Some(asset);
    }

    pub fn source(&self) -> Option<&ImageAsset> {
        self.source.as_ref()
    }

    pub fn set_request(&mut self, request: EncodeRequest) {
        self.pipeline.request = request;
    }

    /// Plan and draw now; encode in the background.
    ///
    /// Planning and allocation errors are returned immediately. The new
    /// ticket supersedes earlier ones even when this request fails.
    pub fn request(&self, intent: &ResizeIntent) -> Result<(Ticket, PendingEncode), PipelineError> {
        let ticket = self.pipeline.generations.begin();
        let asset = self
            .source
            .as_ref()
            .ok_or_else(|| PipelineError::invalid("no source image loaded"))?;
        let surface = plan_and_resample(
            self.pipeline.backend.as_ref(),
            asset,
            intent,
            &self.catalog,
            &self.pipeline.limits,
        );
        self.pipeline.dispatch(ticket, surface)
    }

    /// Expose a settled encode if `ticket` is still current.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        settled: Settled,
    ) -> Result<Option<&Preview>, PipelineError> {
        self.pipeline.complete(ticket, settled)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.pipeline.preview.current()
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
    }
}

/// Caller-owned state for the icon tool.
pub struct IconSession<B: ?Sized> {
    pipeline: PreviewPipeline<B>,
}

impl<B: ImageBackend + ?Sized + 'static> IconSession<B> {
    pub fn new(backend: Arc<B>, limits: SurfaceLimits, request: EncodeRequest) -> Self {
        Self {
            pipeline: PreviewPipeline::new(backend, limits, request),
        }
    }

    pub fn set_request(&mut self, request: EncodeRequest) {
        self.pipeline.request = request;
    }

    /// Draw `spec` now; encode in the background.
    pub fn request(&self, spec: &SynthesisSpec) -> Result<(Ticket, PendingEncode), PipelineError> {
        let ticket = self.pipeline.generations.begin();
        let surface = synthesize(self.pipeline.backend.as_ref(), spec, self.pipeline.limits);
        self.pipeline.dispatch(ticket, surface)
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        settled: Settled,
    ) -> Result<Option<&Preview>, PipelineError> {
        self.pipeline.complete(ticket, settled)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.pipeline.preview.current()
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
    }
}
