//! Median filter.
//!
//! Each output sample is the median of the `k x k` window around it, taken
//! per channel with the same edge-clamp addressing as [`crate::convolve`].
//! `k` is odd, so the median is always a single element (index `k² / 2` of
//! the sorted window); no interpolation is needed.

use crate::kernel::validate_kernel_size;
use crate::parallel::{for_each_row, Schedule};
use crate::OpsResult;
use imgproc_core::RasterImage;
use tracing::trace;

/// Applies a `size x size` median filter.
///
/// # Errors
///
/// [`crate::OpsError::InvalidParameter`] if `size` is not a positive odd integer.
///
/// # Example
///
/// ```rust
/// use imgproc_core::RasterImage;
/// use imgproc_ops::median::median;
///
/// let mut data = vec![50u8; 9];
/// data[4] = 255; // spike
/// let src = RasterImage::new(3, 3, 1, data).unwrap();
/// assert_eq!(median(&src, 3).unwrap().sample(1, 1, 0), 50);
/// ```
pub fn median(image: &RasterImage, size: usize) -> OpsResult<RasterImage> {
    median_with(image, size, Schedule::default())
}

/// [`median`] with an explicit row schedule.
pub fn median_with(image: &RasterImage, size: usize, schedule: Schedule) -> OpsResult<RasterImage> {
    let size = validate_kernel_size(i64::try_from(size).unwrap_or(i64::MAX))?;
    trace!(width = image.width(), height = image.height(), channels = image.channels(), size, "median");

    let width = image.width() as i64;
    let channels = image.channels();
    let radius = (size / 2) as i64;
    let mid = size * size / 2;

    let mut dst = vec![0u8; image.data().len()];

    for_each_row(&mut dst, image.row_len(), schedule, |y, row| {
        let mut window = Vec::with_capacity(size * size);
        for x in 0..width {
            for c in 0..channels {
                window.clear();
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        window.push(image.sample_clamped(x + dx, y as i64 + dy, c));
                    }
                }
                let (_, m, _) = window.select_nth_unstable(mid);
                row[x as usize * channels + c] = *m;
            }
        }
    });

    Ok(RasterImage::new(image.width(), image.height(), channels, dst)?)
}
