//! Grayscale conversion and binary thresholding.
//!
//! Luminance uses the Rec.601 weights `0.299 R + 0.587 G + 0.114 B`, rounded
//! to the nearest integer. Single-channel input is taken as luminance
//! directly; an alpha channel is ignored.

use crate::{OpsError, OpsResult};
use imgproc_core::RasterImage;
use tracing::trace;

/// Rec.601 luma weights scaled by 1000.
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Luminance of one RGB triple, `round(0.299 R + 0.587 G + 0.114 B)`.
///
/// Integer arithmetic keeps the rounding exact; the weights sum to 1000 so
/// the result never exceeds 255.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32 + 500) / 1000) as u8
}

/// Reduces an image to a single luminance channel.
pub fn luminance(image: &RasterImage) -> OpsResult<RasterImage> {
    trace!(width = image.width(), height = image.height(), channels = image.channels(), "luminance");

    let data = match image.channels() {
        1 => image.data().to_vec(),
        c => image
            .data()
            .chunks_exact(c)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect(),
    };
    Ok(RasterImage::new(image.width(), image.height(), 1, data)?)
}

/// Validates a user-supplied threshold (`0..=255`).
pub fn validate_threshold(value: i64) -> OpsResult<u8> {
    u8::try_from(value).map_err(|_| {
        OpsError::invalid_parameter("threshold", format!("must be in 0..=255, got {}", value))
    })
}

/// Binarizes an image: 255 where luminance >= `threshold`, else 0.
///
/// The result is always single-channel.
///
/// # Errors
///
/// [`OpsError::InvalidParameter`] if `threshold` is outside `0..=255`.
///
/// # Example
///
/// ```rust
/// use imgproc_core::RasterImage;
/// use imgproc_ops::threshold::threshold;
///
/// let gray = RasterImage::filled(4, 4, 3, 128).unwrap();
/// let out = threshold(&gray, 128).unwrap();
/// assert_eq!(out.channels(), 1);
/// assert!(out.data().iter().all(|&v| v == 255));
/// ```
pub fn threshold(image: &RasterImage, threshold: i64) -> OpsResult<RasterImage> {
    let t = validate_threshold(threshold)?;
    let gray = luminance(image)?;
    binarize(&gray, t)
}

/// Thresholds an already single-channel image.
pub fn binarize(gray: &RasterImage, t: u8) -> OpsResult<RasterImage> {
    debug_assert_eq!(gray.channels(), 1);
    let data = gray
        .data()
        .iter()
        .map(|&v| if v >= t { 255 } else { 0 })
        .collect();
    Ok(RasterImage::new(gray.width(), gray.height(), 1, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(128, 128, 128), 128);
        assert_eq!(luma(255, 0, 0), 76); // 76.245
        assert_eq!(luma(0, 255, 0), 150); // 149.685
        assert_eq!(luma(0, 0, 255), 29); // 29.07
        // 0.299*1 + 0.587*0 + 0.114*2 = 0.527 -> 1
        assert_eq!(luma(1, 0, 2), 1);
    }

    #[test]
    fn test_luminance_shapes() {
        let rgb = RasterImage::from_pixel(3, 2, &[255, 0, 0]).unwrap();
        let g = luminance(&rgb).unwrap();
        assert_eq!(g.channels(), 1);
        assert_eq!(g.dimensions(), (3, 2));
        assert!(g.data().iter().all(|&v| v == 76));

        let single = RasterImage::new(2, 1, 1, vec![3, 250]).unwrap();
        assert_eq!(luminance(&single).unwrap(), single);
    }

    #[test]
    fn test_alpha_ignored() {
        let opaque = RasterImage::from_pixel(2, 2, &[10, 200, 30, 255]).unwrap();
        let clear = RasterImage::from_pixel(2, 2, &[10, 200, 30, 0]).unwrap();
        assert_eq!(luminance(&opaque).unwrap(), luminance(&clear).unwrap());
    }

    #[test]
    fn test_threshold_binary_and_inclusive() {
        let src = RasterImage::new(4, 1, 1, vec![0, 99, 100, 255]).unwrap();
        let out = threshold(&src, 100).unwrap();
        assert_eq!(out.data(), &[0, 0, 255, 255]);

        // t = 0 admits everything
        assert!(threshold(&src, 0).unwrap().data().iter().all(|&v| v == 255));
        // t = 255 admits only full white
        assert_eq!(threshold(&src, 255).unwrap().data(), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_threshold_is_idempotent() {
        let data: Vec<u8> = (0..48).map(|v| (v * 29 % 256) as u8).collect();
        let src = RasterImage::new(4, 4, 3, data).unwrap();
        let once = threshold(&src, 128).unwrap();
        let twice = threshold(&once, 128).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let src = RasterImage::filled(2, 2, 1, 0).unwrap();
        for t in [-1, 256, 300] {
            assert!(matches!(
                threshold(&src, t),
                Err(OpsError::InvalidParameter { name: "threshold", .. })
            ));
        }
    }
}
