//! JPEG decoding.
//!
//! Baseline and progressive JPEG via `jpeg-decoder`. Output layouts:
//!
//! | JPEG pixel format | Raster channels |
//! |-------------------|-----------------|
//! | L8                | 1               |
//! | L16               | 1 (high byte)   |
//! | RGB24             | 3               |
//! | CMYK32            | 3 (converted)   |
//!
//! Writing JPEG is not supported; filter output is always PNG.

use crate::{IoError, IoResult};
use imgproc_core::RasterImage;
use jpeg_decoder::PixelFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;

/// Reads a JPEG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode(BufReader::new(file))
}

/// Decodes a JPEG held in memory.
pub fn read_from_memory(bytes: &[u8]) -> IoResult<RasterImage> {
    decode(bytes)
}

fn decode<R: Read>(source: R) -> IoResult<RasterImage> {
    let mut decoder = jpeg_decoder::Decoder::new(source);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG header".into()))?;

    trace!(width = info.width, height = info.height, format = ?info.pixel_format, "jpeg decoded");

    let (channels, data) = match info.pixel_format {
        PixelFormat::L8 => (1, pixels),
        PixelFormat::L16 => (1, pixels.chunks_exact(2).map(|s| s[0]).collect()),
        PixelFormat::RGB24 => (3, pixels),
        PixelFormat::CMYK32 => (3, cmyk_to_rgb(&pixels)),
        #[allow(unreachable_patterns)]
        other => {
            return Err(IoError::UnsupportedFormat(format!("JPEG pixel format {:?}", other)));
        }
    };

    Ok(RasterImage::new(info.width as u32, info.height as u32, channels, data)?)
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|p| {
            let k = 255 - p[3] as u32;
            let ch = |v: u8| (((255 - v as u32) * k + 127) / 255) as u8;
            [ch(p[0]), ch(p[1]), ch(p[2])]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 255, 0]), vec![0, 255, 0]);
    }

    #[test]
    fn test_truncated_stream_is_decode_error() {
        let err = read_from_memory(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap_err();
        assert!(matches!(err, IoError::DecodeError(_)));
    }
}
