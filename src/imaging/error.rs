//! Pipeline error type shared by planning, drawing and encoding.
//!
//! Every failure a caller can observe is one of three kinds:
//!
//! | Kind | Raised by | Effect |
//! |---|---|---|
//! | [`ErrorKind::InvalidInput`] | planner, asset loading, spec validation | request rejected before any surface exists |
//! | [`ErrorKind::EncodeFailure`] | encoder | that artifact is missing; a batch carries on |
//! | [`ErrorKind::ResourceExhausted`] | surface allocation | that request is aborted |
//!
//! I/O errors only come from the file-based convenience constructors and are
//! reported as their own kind.

use super::backend::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cannot encode {requested}: {reason}")]
    EncodeFailure {
        requested: String,
        reason: EncodeFailureReason,
    },
    #[error("Surface {width}x{height} exceeds the allocation limit ({limit})")]
    ResourceExhausted {
        width: u32,
        height: u32,
        limit: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an encode did not produce the requested format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeFailureReason {
    #[error("no encoder for this mime type")]
    Unsupported,
    #[error("encoder produced {produced} instead")]
    MimeMismatch { produced: String },
    #[error("{0}")]
    Backend(String),
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    EncodeFailure,
    ResourceExhausted,
    Io,
}

impl PipelineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::EncodeFailure { .. } => ErrorKind::EncodeFailure,
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => Self::Io(e),
            BackendError::Decode(msg) => Self::InvalidInput(msg),
            BackendError::Encode { mime, message } => Self::EncodeFailure {
                requested: mime,
                reason: EncodeFailureReason::Backend(message),
            },
        }
    }
}
