//! Error types for imgproc-core.
//!
//! Every failure here is a violated buffer invariant: a [`crate::RasterImage`]
//! is only ever constructed with non-zero dimensions, a supported channel
//! count and a buffer of exactly `width * height * channels` samples.
//!
//! # Usage
//!
//! ```rust
//! use imgproc_core::{Error, RasterImage};
//!
//! let err = RasterImage::new(2, 2, 3, vec![0; 5]).unwrap_err();
//! assert!(matches!(err, Error::BufferSize { .. }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or validating a raster buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Width or height is zero, or the sample count overflows `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// Channel count outside {1, 3, 4}.
    #[error("unsupported channel count: {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(usize),

    /// Buffer length differs from `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSize {
        /// Required sample count
        expected: usize,
        /// Supplied sample count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}
