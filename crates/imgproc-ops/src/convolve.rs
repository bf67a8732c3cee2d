//! Convolution engine.
//!
//! Applies a [`Kernel`] channel-wise to a [`RasterImage`]. Out-of-range
//! neighbours are read with edge-clamp addressing: a tap that falls outside
//! `[0, W) x [0, H)` takes the nearest in-bounds pixel. A constant image is
//! therefore left unchanged by any normalized kernel, borders included.
//!
//! Responses are accumulated in `f64`, clamped to `[0, 255]` and rounded to
//! the nearest integer.
//!
//! # Example
//!
//! ```rust
//! use imgproc_core::RasterImage;
//! use imgproc_ops::convolve::convolve;
//! use imgproc_ops::kernel::Kernel;
//!
//! let src = RasterImage::filled(8, 8, 3, 90).unwrap();
//! let out = convolve(&src, &Kernel::box_filter(3).unwrap()).unwrap();
//! assert_eq!(out, src);
//! ```

use crate::kernel::Kernel;
use crate::parallel::{for_each_row, Schedule};
use crate::OpsResult;
use imgproc_core::RasterImage;
use tracing::trace;

/// Convolves `image` with `kernel`, producing an image of the same shape.
pub fn convolve(image: &RasterImage, kernel: &Kernel) -> OpsResult<RasterImage> {
    convolve_with(image, kernel, Schedule::default())
}

/// [`convolve`] with an explicit row schedule.
pub fn convolve_with(image: &RasterImage, kernel: &Kernel, schedule: Schedule) -> OpsResult<RasterImage> {
    trace!(
        width = image.width(),
        height = image.height(),
        channels = image.channels(),
        kernel = kernel.size(),
        "convolve"
    );

    let row_len = image.row_len();
    let mut dst = vec![0u8; image.data().len()];

    for_each_row(&mut dst, row_len, schedule, |y, row| {
        let mut sums = vec![0.0f64; row_len];
        accumulate_row(image, kernel, y, &mut sums);
        for (out, sum) in row.iter_mut().zip(&sums) {
            *out = quantize(*sum);
        }
    });

    Ok(RasterImage::new(image.width(), image.height(), image.channels(), dst)?)
}

/// Sobel gradient magnitude, `sqrt(gx² + gy²)` per channel.
///
/// Flat regions produce 0. The alpha channel of RGBA input is copied through
/// unchanged.
pub fn sobel_magnitude(image: &RasterImage) -> OpsResult<RasterImage> {
    sobel_magnitude_with(image, Schedule::default())
}

/// [`sobel_magnitude`] with an explicit row schedule.
pub fn sobel_magnitude_with(image: &RasterImage, schedule: Schedule) -> OpsResult<RasterImage> {
    trace!(width = image.width(), height = image.height(), channels = image.channels(), "sobel_magnitude");

    let kx = Kernel::sobel_x();
    let ky = Kernel::sobel_y();
    let channels = image.channels();
    let row_len = image.row_len();
    let mut dst = vec![0u8; image.data().len()];

    for_each_row(&mut dst, row_len, schedule, |y, row| {
        let mut gx = vec![0.0f64; row_len];
        let mut gy = vec![0.0f64; row_len];
        accumulate_row(image, &kx, y, &mut gx);
        accumulate_row(image, &ky, y, &mut gy);

        let src = image.row(y as u32);
        for i in 0..row_len {
            row[i] = if image.has_alpha() && i % channels == 3 {
                src[i]
            } else {
                quantize(gx[i].hypot(gy[i]))
            };
        }
    });

    Ok(RasterImage::new(image.width(), image.height(), channels, dst)?)
}

/// Clamps to `[0, 255]` and rounds to the nearest integer.
#[inline]
pub(crate) fn quantize(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

/// Fills `sums` with the signed kernel response for every sample of row `y`.
fn accumulate_row(image: &RasterImage, kernel: &Kernel, y: usize, sums: &mut [f64]) {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let channels = image.channels();
    let radius = kernel.radius() as i64;

    sums.fill(0.0);

    for ky in 0..kernel.size() {
        let sy = (y as i64 + ky as i64 - radius).clamp(0, height - 1);
        let src_row = image.row(sy as u32);

        for kx in 0..kernel.size() {
            let weight = kernel.weight(ky, kx);
            if weight == 0.0 {
                continue;
            }
            let dx = kx as i64 - radius;

            for x in 0..width {
                let sx = (x + dx).clamp(0, width - 1) as usize;
                let src = &src_row[sx * channels..(sx + 1) * channels];
                let dst = &mut sums[x as usize * channels..(x as usize + 1) * channels];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += *s as f64 * weight;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MAX_KERNEL_SIZE;

    fn ramp(width: u32, height: u32, channels: usize) -> RasterImage {
        let data = (0..width as usize * height as usize * channels)
            .map(|i| ((i * 37 + i / 7) % 256) as u8)
            .collect();
        RasterImage::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn test_identity_kernel() {
        let src = ramp(7, 5, 3);
        assert_eq!(convolve(&src, &Kernel::identity()).unwrap(), src);
        assert_eq!(convolve(&src, &Kernel::box_filter(1).unwrap()).unwrap(), src);
    }

    #[test]
    fn test_constant_image_unchanged() {
        for channels in [1, 3, 4] {
            let src = RasterImage::filled(9, 6, channels, 201).unwrap();
            for kernel in [
                Kernel::box_filter(5).unwrap(),
                Kernel::gaussian(7, 2.0).unwrap(),
                Kernel::box_filter(21).unwrap(),
            ] {
                assert_eq!(convolve(&src, &kernel).unwrap(), src);
            }
        }
    }

    #[test]
    fn test_edge_clamp_border_value() {
        // 3x1 row [0, 90, 180]; at x=0 the 3-tap box sees [0, 0, 90].
        let src = RasterImage::new(3, 1, 1, vec![0, 90, 180]).unwrap();
        let out = convolve(&src, &Kernel::box_filter(3).unwrap()).unwrap();
        assert_eq!(out.data(), &[30, 90, 150]);
    }

    #[test]
    fn test_channels_are_independent() {
        let src = RasterImage::new(2, 1, 3, vec![10, 0, 255, 30, 0, 255]).unwrap();
        let out = convolve(&src, &Kernel::box_filter(3).unwrap()).unwrap();
        // Channel 0 at x=0: (10 + 10 + 30) / 3 ≈ 16.67 -> 17
        assert_eq!(out.pixel(0, 0), &[17, 0, 255]);
        assert_eq!(out.pixel(1, 0), &[23, 0, 255]);
    }

    #[test]
    fn test_output_is_clamped() {
        let src = RasterImage::new(3, 1, 1, vec![0, 200, 0]).unwrap();
        let sharpen = Kernel::new(vec![0.0, 0.0, 0.0, -1.0, 3.0, -1.0, 0.0, 0.0, 0.0], 3).unwrap();
        let out = convolve(&src, &sharpen).unwrap();
        assert_eq!(out.data(), &[0, 255, 0]);
    }

    #[test]
    fn test_row_response_keeps_sign() {
        let src = RasterImage::new(3, 1, 1, vec![100, 50, 0]).unwrap();
        let mut gx = vec![0.0f64; 3];
        accumulate_row(&src, &Kernel::sobel_x(), 0, &mut gx);
        // Centre: -(100)*4 + 0*4 = -400 (three rows of the clamped image)
        assert_eq!(gx[1], -400.0);
    }

    #[test]
    fn test_constant_image_unchanged_at_max_kernel_size() {
        let kernels = [
            Kernel::box_filter(MAX_KERNEL_SIZE).unwrap(),
            Kernel::gaussian(MAX_KERNEL_SIZE, 1e4).unwrap(),
            Kernel::gaussian(501, 1e4).unwrap(),
        ];
        for value in [127, 201, 254, 255] {
            let src = RasterImage::filled(2, 2, 1, value).unwrap();
            for kernel in &kernels {
                assert_eq!(convolve(&src, kernel).unwrap(), src, "value {} size {}", value, kernel.size());
            }
        }
    }

    #[test]
    fn test_sobel_flat_is_zero() {
        let src = RasterImage::filled(6, 6, 3, 77).unwrap();
        let out = sobel_magnitude(&src).unwrap();
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_sobel_detects_step() {
        // Vertical step between columns 1 and 2.
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[0, 0, 100, 100]);
        }
        let src = RasterImage::new(4, 4, 1, data).unwrap();
        let out = sobel_magnitude(&src).unwrap();
        for y in 0..4 {
            assert_eq!(out.sample(0, y, 0), 0);
            assert_eq!(out.sample(1, y, 0), 255);
            assert_eq!(out.sample(2, y, 0), 255);
            assert_eq!(out.sample(3, y, 0), 0);
        }
    }

    #[test]
    fn test_sobel_keeps_alpha() {
        let src = RasterImage::from_pixel(3, 3, &[5, 6, 7, 200]).unwrap();
        let out = sobel_magnitude(&src).unwrap();
        assert_eq!(out.channels(), 4);
        for px in out.data().chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 200]);
        }
    }

    #[test]
    fn test_serial_matches_default() {
        let src = ramp(31, 17, 4);
        let gauss = Kernel::gaussian(5, 1.3).unwrap();
        assert_eq!(
            convolve_with(&src, &gauss, Schedule::Serial).unwrap(),
            convolve(&src, &gauss).unwrap()
        );
        assert_eq!(
            sobel_magnitude_with(&src, Schedule::Serial).unwrap(),
            sobel_magnitude(&src).unwrap()
        );
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(300.0), 255);
        assert_eq!(quantize(127.5), 128);
        assert_eq!(quantize(127.49), 127);
    }
}
