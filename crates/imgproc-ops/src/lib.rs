//! # imgproc-ops
//!
//! Filter engines for the imgproc command-line tool.
//!
//! Every engine takes a [`RasterImage`](imgproc_core::RasterImage) and
//! returns a new one; inputs are never modified. Neighbourhood operations
//! read outside the image with edge-clamp addressing.
//!
//! # Modules
//!
//! - [`kernel`] - Box, Gaussian and Sobel kernels, kernel-size validation
//! - [`convolve`] - Channel-wise convolution and Sobel magnitude
//! - [`median`] - Median filter
//! - [`threshold`] - Luminance and binary threshold
//! - [`dispatch`] - Filter ids, parameter parsing, end-to-end [`run`]
//!
//! # Example
//!
//! ```rust,ignore
//! use imgproc_ops::{run, EngineOptions, FilterRequest};
//!
//! let request = FilterRequest::from_args("1", "noisy.png", &["5"])?;
//! run(&request, &EngineOptions::default())?; // writes ./median.png
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` - Process rows on the rayon global pool (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod kernel;
pub mod parallel;
pub mod convolve;
pub mod median;
pub mod threshold;
pub mod dispatch;

pub use error::{ErrorKind, OpsError, OpsResult};
pub use kernel::Kernel;
pub use parallel::Schedule;
pub use dispatch::{
    apply, run, EngineOptions, FilterKind, FilterOutcome, FilterParams, FilterRequest,
};
