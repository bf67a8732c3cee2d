//! 8-bit raster image buffer.
//!
//! # Memory Layout
//!
//! Pixels are stored in **row-major** order, top-to-bottom, with channels
//! interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//!         ...
//! ```
//!
//! Grayscale images carry one sample per pixel, RGBA images four.
//!
//! # Ownership
//!
//! A [`RasterImage`] owns its buffer outright. Filter stages borrow the input
//! and allocate a new image for their output, so no two stages ever alias the
//! same samples.
//!
//! # Usage
//!
//! ```rust
//! use imgproc_core::RasterImage;
//!
//! let img = RasterImage::filled(4, 4, 3, 128).unwrap();
//! assert_eq!(img.sample(3, 3, 2), 128);
//! assert_eq!(img.data().len(), 4 * 4 * 3);
//! ```

use crate::{Error, Result};

/// Channel counts a [`RasterImage`] may carry.
pub const SUPPORTED_CHANNELS: [usize; 3] = [1, 3, 4];

/// Owned 8-bit image buffer with 1, 3 or 4 interleaved channels.
///
/// The buffer length is always exactly `width * height * channels`.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Creates an image from existing samples.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if width or height is zero
    /// - [`Error::UnsupportedChannels`] if `channels` is not 1, 3 or 4
    /// - [`Error::BufferSize`] if `data.len() != width * height * channels`
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = Self::sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Creates an image with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: usize, value: u8) -> Result<Self> {
        let len = Self::sample_count(width, height, channels)?;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Creates an image by repeating one pixel value.
    ///
    /// The pixel length determines the channel count.
    ///
    /// ```rust
    /// use imgproc_core::RasterImage;
    ///
    /// let img = RasterImage::from_pixel(2, 1, &[10, 20, 30]).unwrap();
    /// assert_eq!(img.data(), &[10, 20, 30, 10, 20, 30]);
    /// ```
    pub fn from_pixel(width: u32, height: u32, pixel: &[u8]) -> Result<Self> {
        let len = Self::sample_count(width, height, pixel.len())?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(pixel);
        }
        Self::new(width, height, pixel.len(), data)
    }

    /// Validates dimensions and returns `width * height * channels`.
    fn sample_count(width: u32, height: u32, channels: usize) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "width and height must be > 0"));
        }
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(Error::UnsupportedChannels(channels));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| Error::invalid_dimensions(width, height, "sample count overflows"))
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the image dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of interleaved channels (1, 3 or 4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `true` for 4-channel images, whose last channel is alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of samples in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels
    }

    /// Returns the raw samples.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image and returns its sample buffer.
    #[inline]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns one row of samples.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.row_len();
        &self.data[start..start + self.row_len()]
    }

    /// Returns the pixel at (x, y) as a channel slice.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let offset = (y as usize * self.width as usize + x as usize) * self.channels;
        &self.data[offset..offset + self.channels]
    }

    /// Returns channel `c` of the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates or channel are out of range.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, c: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height && c < self.channels);
        self.data[(y as usize * self.width as usize + x as usize) * self.channels + c]
    }

    /// Returns channel `c` at signed coordinates using edge-clamp addressing.
    ///
    /// Coordinates outside the image read the nearest in-bounds pixel.
    #[inline]
    pub fn sample_clamped(&self, x: i64, y: i64, c: usize) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.sample(cx, cy, c)
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
