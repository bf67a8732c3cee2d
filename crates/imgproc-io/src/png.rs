//! PNG format support.
//!
//! Decoding normalizes every PNG flavour to 8-bit samples: palettes and
//! low bit depths are expanded, 16-bit samples are stripped to their high
//! byte. Grayscale+alpha becomes RGBA since rasters carry 1, 3 or 4 channels.
//!
//! Encoding always produces 8-bit PNG with the image's own channel layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgproc_io::png;
//!
//! let image = png::read("input.png")?;
//! let bytes = png::encode(&image)?;
//! ```

use crate::{IoError, IoResult};
use imgproc_core::RasterImage;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;
use tracing::trace;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode(BufReader::new(file))
}

/// Decodes a PNG held in memory.
pub fn read_from_memory(bytes: &[u8]) -> IoResult<RasterImage> {
    decode(Cursor::new(bytes))
}

fn decode<R: BufRead + Seek>(source: R) -> IoResult<RasterImage> {
    let mut decoder = png::Decoder::new(source);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    trace!(width = info.width, height = info.height, color = ?info.color_type, "png decoded");

    if info.bit_depth != png::BitDepth::Eight {
        return Err(IoError::DecodeError(format!(
            "unexpected bit depth after expansion: {:?}",
            info.bit_depth
        )));
    }

    let (channels, data) = match info.color_type {
        png::ColorType::Grayscale => (1, buf),
        png::ColorType::Rgb => (3, buf),
        png::ColorType::Rgba => (4, buf),
        png::ColorType::GrayscaleAlpha => {
            let rgba: Vec<u8> = buf
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect();
            (4, rgba)
        }
        png::ColorType::Indexed => {
            return Err(IoError::DecodeError("palette was not expanded".into()));
        }
    };

    Ok(RasterImage::new(info.width, info.height, channels, data)?)
}

/// Encodes an image as an 8-bit PNG in memory.
pub fn encode(image: &RasterImage) -> IoResult<Vec<u8>> {
    let color_type = match image.channels() {
        1 => png::ColorType::Grayscale,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {}", n))),
    };

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, image.width(), image.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::default());

        let mut writer = encoder
            .write_header()
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer
            .write_image_data(image.data())
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
    }

    trace!(bytes = bytes.len(), "png encoded");
    Ok(bytes)
}
