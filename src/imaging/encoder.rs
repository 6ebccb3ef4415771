//! Surface → encoded artifact, with format verification.
//!
//! Every encode is checked after the fact: the produced bytes are sniffed and
//! compared against the requested format. A backend that quietly hands back
//! PNG when asked for WebP produces an [`EncodeFailure`], not an artifact
//! with the wrong label. The only way to get a different format is to opt in
//! with [`EncodeRequest::allow_png_fallback`], and then the artifact says so
//! in [`OutputArtifact::substituted_from`].
//!
//! [`encode_in_background`] runs the same encode on the rayon pool. The
//! surface moves into the returned [`PendingEncode`] and comes back in
//! [`Settled`], so nothing can draw on it while the encode is in flight.
//!
//! [`EncodeFailure`]: PipelineError::EncodeFailure

use super::backend::ImageBackend;
use super::error::{EncodeFailureReason, PipelineError};
use super::params::{Color, EncodeRequest, OutputFormat};
use super::surface::RasterSurface;
use futures::FutureExt;
use futures::channel::oneshot;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// One encoded image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    width: u32,
    height: u32,
    mime_type: String,
    bytes: Vec<u8>,
    substituted_from: Option<String>,
}

impl OutputArtifact {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mime type of the bytes actually produced.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// The requested mime type when an allowed PNG fallback replaced it.
    pub fn substituted_from(&self) -> Option<&str> {
        self.substituted_from.as_deref()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        OutputFormat::parse(&self.mime_type)
    }
}

/// Encode the surface as requested.
pub fn encode<B: ImageBackend + ?Sized>(
    backend: &B,
    surface: &RasterSurface,
    request: &EncodeRequest,
) -> Result<OutputArtifact, PipelineError> {
    let requested = request.mime_type.trim();
    let (format, substituted_from) = resolve_format(backend, requested, request.allow_png_fallback)?;

    let bytes = if format == OutputFormat::Jpeg {
        backend.encode(&surface.flattened(Color::WHITE), format, request.quality)?
    } else {
        backend.encode(surface.pixels(), format, request.quality)?
    };

    let produced = image::guess_format(&bytes).ok();
    if produced != Some(format.image_format()) {
        let produced = produced
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|| "unrecognized data".to_string());
        tracing::warn!(requested, %produced, "encoder output does not match request");
        return Err(PipelineError::EncodeFailure {
            requested: requested.to_string(),
            reason: EncodeFailureReason::MimeMismatch { produced },
        });
    }

    tracing::debug!(
        width = surface.width(),
        height = surface.height(),
        mime = format.mime(),
        bytes = bytes.len(),
        "encoded surface"
    );
    Ok(OutputArtifact {
        width: surface.width(),
        height: surface.height(),
        mime_type: format.mime().to_string(),
        bytes,
        substituted_from,
    })
}

fn resolve_format<B: ImageBackend + ?Sized>(
    backend: &B,
    requested: &str,
    allow_png_fallback: bool,
) -> Result<(OutputFormat, Option<String>), PipelineError> {
    match OutputFormat::parse(requested) {
        Some(format) if backend.supports(format) => Ok((format, None)),
        _ if allow_png_fallback && backend.supports(OutputFormat::Png) => {
            tracing::warn!(requested, "no encoder for requested type, falling back to PNG");
            Ok((OutputFormat::Png, Some(requested.to_string())))
        }
        _ => Err(PipelineError::EncodeFailure {
            requested: requested.to_string(),
            reason: EncodeFailureReason::Unsupported,
        }),
    }
}

/// A finished background encode: the surface handed back plus the outcome.
#[derive(Debug)]
pub struct Settled {
    pub surface: RasterSurface,
    pub result: Result<OutputArtifact, PipelineError>,
}

/// Future for an encode running on the rayon pool.
///
/// Resolves to `Err` only if the worker disappeared without reporting, in
/// which case the surface is gone too.
#[must_use = "an encode result is lost unless the future is awaited"]
pub struct PendingEncode {
    requested: String,
    rx: oneshot::Receiver<Settled>,
}

impl Future for PendingEncode {
    type Output = Result<Settled, PipelineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|received| {
            received.map_err(|_| PipelineError::EncodeFailure {
                requested: self.requested.clone(),
                reason: EncodeFailureReason::Backend("encode worker stopped".to_string()),
            })
        })
    }
}

/// Start encoding `surface` on the rayon pool.
pub fn encode_in_background<B: ImageBackend + ?Sized + 'static>(
    backend: Arc<B>,
    surface: RasterSurface,
    request: EncodeRequest,
) -> PendingEncode {
    let (tx, rx) = oneshot::channel();
    let requested = request.mime_type.clone();

    rayon::spawn(move || {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            encode(backend.as_ref(), &surface, &request)
        }))
        .unwrap_or_else(|_| {
            Err(PipelineError::EncodeFailure {
                requested: request.mime_type.clone(),
                reason: EncodeFailureReason::Backend("encoder panicked".to_string()),
            })
        });
        // The receiver may have been dropped; nobody is waiting then.
        let _ = tx.send(Settled { surface, result });
    });

    PendingEncode { requested, rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::error::ErrorKind;
    use crate::imaging::params::{Quality, Shape, SurfaceLimits};
    use crate::imaging::RustBackend;

    fn red_circle(size: u32) -> RasterSurface {
        let mut s = RasterSurface::new(size, size, &SurfaceLimits::default()).unwrap();
        s.fill_shape(Shape::Circle, Color::rgb(255, 0, 0));
        s
    }

    // =========================================================================
    // Synchronous encode
    // =========================================================================

    #[test]
    fn encode_png_reports_dimensions_and_length() {
        let artifact = encode(&RustBackend::new(), &red_circle(24), &EncodeRequest::png()).unwrap();
        assert_eq!((artifact.width(), artifact.height()), (24, 24));
        assert_eq!(artifact.mime_type(), "image/png");
        assert_eq!(artifact.byte_length(), artifact.bytes().len());
        assert!(artifact.substituted_from().is_none());
    }

    #[test]
    fn mime_type_may_be_given_as_extension() {
        let artifact = encode(
            &RustBackend::new(),
            &red_circle(8),
            &EncodeRequest::new("webp"),
        )
        .unwrap();
        assert_eq!(artifact.mime_type(), "image/webp");
        assert_eq!(artifact.format(), Some(OutputFormat::WebP));
    }

    #[test]
    fn jpeg_is_flattened_over_white() {
        let artifact = encode(
            &RustBackend::new(),
            &red_circle(128),
            &EncodeRequest::new("image/jpeg").with_quality(Quality::new(95)),
        )
        .unwrap();
        let decoded = image::load_from_memory(artifact.bytes()).unwrap().to_rgb8();
        // Transparent corner becomes (near) white, not black.
        let corner = decoded.get_pixel(0, 0);
        assert!(corner.0.iter().all(|&c| c > 230), "corner was {corner:?}");
    }

    #[test]
    fn unknown_mime_is_unsupported() {
        let err = encode(
            &RustBackend::new(),
            &red_circle(8),
            &EncodeRequest::new("image/bmp"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EncodeFailure {
                reason: EncodeFailureReason::Unsupported,
                ..
            }
        ));
    }

    #[test]
    fn backend_without_encoder_is_unsupported() {
        let backend = MockBackend::without(&[OutputFormat::Avif]);
        let err = encode(&backend, &red_circle(8), &EncodeRequest::new("image/avif")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeFailure);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn silent_substitution_is_a_mime_mismatch() {
        let backend = MockBackend::substituting(OutputFormat::Png);
        let err = encode(&backend, &red_circle(8), &EncodeRequest::new("image/webp")).unwrap_err();
        match err {
            PipelineError::EncodeFailure {
                requested,
                reason: EncodeFailureReason::MimeMismatch { produced },
            } => {
                assert_eq!(requested, "image/webp");
                assert_eq!(produced, "image/png");
            }
            other => panic!("expected mime mismatch, got {other:?}"),
        }
    }

    #[test]
    fn allowed_fallback_is_flagged_on_the_artifact() {
        let backend = MockBackend::without(&[OutputFormat::WebP]);
        let mut request = EncodeRequest::new("image/webp");
        request.allow_png_fallback = true;

        let artifact = encode(&backend, &red_circle(8), &request).unwrap();
        assert_eq!(artifact.mime_type(), "image/png");
        assert_eq!(artifact.substituted_from(), Some("image/webp"));
    }

    #[test]
    fn quality_is_forwarded_to_backend() {
        let backend = MockBackend::new();
        let request = EncodeRequest::new("image/jpeg").with_quality(Quality::new(42));
        encode(&backend, &red_circle(8), &request).unwrap();
        assert!(backend.get_operations().iter().any(|op| matches!(
            op,
            crate::imaging::backend::tests::RecordedOp::Encode { quality: 42, .. }
        )));
    }

    #[test]
    fn backend_error_is_encode_failure() {
        let backend = MockBackend::failing_on(&[8]);
        let err = encode(&backend, &red_circle(8), &EncodeRequest::png()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EncodeFailure {
                reason: EncodeFailureReason::Backend(_),
                ..
            }
        ));
    }

    // =========================================================================
    // Background encode
    // =========================================================================

    #[test]
    fn background_encode_returns_surface_and_artifact() {
        let pending = encode_in_background(
            Arc::new(RustBackend::new()),
            red_circle(16),
            EncodeRequest::png(),
        );
        let settled = futures::executor::block_on(pending).unwrap();
        assert_eq!(settled.surface.dimensions(), (16, 16));
        let artifact = settled.result.unwrap();
        assert_eq!(artifact.width(), 16);
    }

    #[test]
    fn background_encode_carries_failures() {
        let pending = encode_in_background(
            Arc::new(MockBackend::substituting(OutputFormat::Png)),
            red_circle(16),
            EncodeRequest::new("image/jpeg"),
        );
        let settled = futures::executor::block_on(pending).unwrap();
        assert_eq!(settled.result.unwrap_err().kind(), ErrorKind::EncodeFailure);
    }
}
