//! # imgproc-core
//!
//! Core types shared by the imgproc crates.
//!
//! - [`RasterImage`] - Dense 8-bit interleaved pixel buffer (1, 3 or 4 channels)
//! - [`Error`] / [`Result`] - Buffer construction errors
//!
//! ## Crate Structure
//!
//! ```text
//! imgproc-core (this crate)
//!    ^
//!    |
//!    +-- imgproc-io  (decode / encode)
//!    +-- imgproc-ops (filter engines, dispatcher)
//!           ^
//!           +-- imgproc-cli (the `imgproc` binary)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;

pub use error::{Error, Result};
pub use image::RasterImage;
