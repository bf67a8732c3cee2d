//! Error types for filter operations.

use imgproc_io::IoError;
use thiserror::Error;

/// Error type for filter operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Wrong number of positional parameters or unrecognized filter id.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A filter parameter is out of range or unparsable.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name (`kernel_size`, `sigma`, `threshold`).
        name: &'static str,
        /// What is wrong with the supplied value.
        reason: String,
    },

    /// Input could not be read/decoded or output could not be written.
    #[error("I/O failure: {0}")]
    Io(#[from] IoError),

    /// An engine produced a buffer that violates the raster invariants.
    #[error("invalid image: {0}")]
    Image(#[from] imgproc_core::Error),
}

impl OpsError {
    /// Creates an [`OpsError::InvalidParameter`] error.
    #[inline]
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Io(_) => ErrorKind::IoFailure,
            Self::Image(_) => ErrorKind::Image,
        }
    }
}

/// Coarse classification of [`OpsError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad invocation shape.
    InvalidArgument,
    /// Bad parameter value.
    InvalidParameter,
    /// Filesystem or codec failure.
    IoFailure,
    /// Raster invariant violated.
    Image,
}

/// Result type for filter operations.
pub type OpsResult<T> = Result<T, OpsError>;
