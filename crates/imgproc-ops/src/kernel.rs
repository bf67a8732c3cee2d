//! Convolution kernels.
//!
//! # Kernels
//!
//! - [`Kernel::box_filter`] - Uniform average, every weight `1/k²`
//! - [`Kernel::gaussian`] - Normalized Gaussian
//! - [`Kernel::sobel_x`] / [`Kernel::sobel_y`] - Sobel gradient pair for edges
//! - [`Kernel::identity`] - Single weight of 1
//!
//! All kernels are square with an odd side length, stored row-major as `f64`
//! so that sums over the largest kernels stay exact to well under one level.
//!
//! # Example
//!
//! ```rust
//! use imgproc_ops::kernel::Kernel;
//!
//! let k = Kernel::gaussian(5, 1.5).unwrap();
//! assert_eq!(k.size(), 5);
//! assert!((k.sum() - 1.0).abs() < 1e-5);
//! ```

use crate::{OpsError, OpsResult};
use tracing::debug;

/// Largest accepted kernel side length.
pub const MAX_KERNEL_SIZE: usize = 1023;

/// Square convolution kernel with odd side length and `f64` weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<f64>,
    size: usize,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if `size` is even or zero, or
    /// `data.len() != size * size`.
    pub fn new(data: Vec<f64>, size: usize) -> OpsResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(OpsError::invalid_parameter(
                "kernel_size",
                format!("must be a positive odd integer, got {}", size),
            ));
        }
        if data.len() != size * size {
            return Err(OpsError::invalid_parameter(
                "kernel_size",
                format!("kernel data size {} doesn't match {}x{}", data.len(), size, size),
            ));
        }
        Ok(Self { data, size })
    }

    /// 1x1 kernel that leaves images unchanged.
    pub fn identity() -> Self {
        Self {
            data: vec![1.0],
            size: 1,
        }
    }

    /// Creates a box (uniform average) kernel.
    ///
    /// ```rust
    /// use imgproc_ops::kernel::Kernel;
    ///
    /// let k = Kernel::box_filter(3).unwrap();
    /// assert_eq!(k.weight(0, 0), 1.0 / 9.0);
    /// ```
    pub fn box_filter(size: usize) -> OpsResult<Self> {
        let size = check_size(size)?;
        let count = size * size;
        debug!(size, "box kernel");
        Ok(Self {
            data: vec![1.0 / count as f64; count],
            size,
        })
    }

    /// Creates a normalized Gaussian kernel.
    ///
    /// Weight at (i, j) is `exp(-((i-c)² + (j-c)²) / (2σ²))` with `c = (k-1)/2`,
    /// then the matrix is scaled to sum to 1.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if `sigma` is not a positive finite
    /// number or `size` is not a positive odd integer.
    pub fn gaussian(size: usize, sigma: f32) -> OpsResult<Self> {
        let size = check_size(size)?;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(OpsError::invalid_parameter(
                "sigma",
                format!("must be a positive number, got {}", sigma),
            ));
        }

        let half = (size / 2) as i64;
        let sigma2 = 2.0 * (sigma as f64) * (sigma as f64);

        let mut weights = Vec::with_capacity(size * size);
        for y in -half..=half {
            for x in -half..=half {
                let d = (x * x + y * y) as f64;
                weights.push((-d / sigma2).exp());
            }
        }

        // The centre weight is exp(0) = 1, so the sum is never zero.
        let sum: f64 = weights.iter().sum();
        let data = weights.into_iter().map(|w| w / sum).collect();

        debug!(size, sigma, "gaussian kernel");
        Ok(Self { data, size })
    }

    /// Horizontal Sobel derivative.
    pub fn sobel_x() -> Self {
        Self {
            data: vec![
                -1.0, 0.0, 1.0,
                -2.0, 0.0, 2.0,
                -1.0, 0.0, 1.0,
            ],
            size: 3,
        }
    }

    /// Vertical Sobel derivative.
    pub fn sobel_y() -> Self {
        Self {
            data: vec![
                -1.0, -2.0, -1.0,
                0.0, 0.0, 0.0,
                1.0, 2.0, 1.0,
            ],
            size: 3,
        }
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half-size, `(size - 1) / 2`.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Weight at (row, col).
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    /// Row-major weights.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Validates a user-supplied kernel size.
///
/// Accepts positive odd integers up to [`MAX_KERNEL_SIZE`].
pub fn validate_kernel_size(size: i64) -> OpsResult<usize> {
    if size <= 0 || size % 2 == 0 {
        return Err(OpsError::invalid_parameter(
            "kernel_size",
            format!("must be a positive odd integer, got {}", size),
        ));
    }
    if size as u64 > MAX_KERNEL_SIZE as u64 {
        return Err(OpsError::invalid_parameter(
            "kernel_size",
            format!("must be at most {}, got {}", MAX_KERNEL_SIZE, size),
        ));
    }
    Ok(size as usize)
}

fn check_size(size: usize) -> OpsResult<usize> {
    validate_kernel_size(i64::try_from(size).unwrap_or(i64::MAX))
}
