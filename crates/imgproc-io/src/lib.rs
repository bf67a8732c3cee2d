//! # imgproc-io
//!
//! Image I/O for the imgproc filter engine.
//!
//! - **PNG** - read (all color types and depths, normalized to 8-bit) and write
//! - **JPEG** - read only
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use imgproc_io::{read, write};
//!
//! let image = read("input.jpg")?;
//! write("output.png", &image)?;
//! ```
//!
//! # Atomic output
//!
//! [`write`] and [`write_all`] encode in memory, write to a temporary file
//! next to each destination and only then rename into place. A failed write
//! never leaves a truncated or half-replaced output file behind.
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG decoding (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};

use imgproc_core::RasterImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

/// Reads an image from a file, auto-detecting the format.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened ([`IoError::Open`])
/// - The format is not supported
/// - The file is corrupted
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    let format = Format::detect(path).map_err(|e| match e {
        IoError::Io(source) => IoError::Open {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    debug!(path = %path.display(), format = format.name(), "reading image");

    let result = match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),

        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    };

    // Codec messages don't know the file name.
    result.map_err(|e| match e {
        IoError::DecodeError(msg) => IoError::DecodeError(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Decodes an image held in memory, auto-detecting the format.
pub fn read_from_memory(bytes: &[u8]) -> IoResult<RasterImage> {
    match Format::from_bytes(bytes) {
        #[cfg(feature = "png")]
        Format::Png => png::read_from_memory(bytes),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read_from_memory(bytes),

        other => Err(IoError::UnsupportedFormat(other.name().into())),
    }
}

/// Writes an image as PNG, replacing `path` atomically.
///
/// The destination directory must already exist.
#[cfg(feature = "png")]
pub fn write<P: AsRef<Path>>(path: P, image: &RasterImage) -> IoResult<()> {
    write_all(&[(path.as_ref(), image)])
}

/// Writes several images as PNG, committing them together.
///
/// Every image is encoded and staged in a temp file next to its destination
/// before any destination is touched, so encode failures, full disks and
/// unwritable directories leave all destinations as they were. Files already
/// at a destination are moved aside during the commit and put back if a
/// later destination fails.
#[cfg(feature = "png")]
pub fn write_all(outputs: &[(&Path, &RasterImage)]) -> IoResult<()> {
    for (path, _) in outputs {
        if path.is_dir() {
            return Err(IoError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::IsADirectory, "destination is a directory"),
            });
        }
    }

    let mut staged = Vec::with_capacity(outputs.len());
    for (path, image) in outputs {
        let bytes = png::encode(image)?;
        staged.push((*path, stage(path, &bytes)?));
    }

    let mut committed: Vec<(&Path, Option<Backup>)> = Vec::with_capacity(staged.len());
    for (path, tmp) in staged {
        let backup = match Backup::take(path) {
            Ok(backup) => backup,
            Err(e) => {
                roll_back(committed);
                return Err(e);
            }
        };
        if let Err(e) = tmp.persist(path) {
            if let Some(backup) = backup {
                restore(path, backup);
            }
            roll_back(committed);
            return Err(IoError::Write {
                path: path.to_path_buf(),
                source: e.error,
            });
        }
        debug!(path = %path.display(), "wrote image");
        committed.push((path, backup));
    }
    Ok(())
}

/// Previous contents of a destination, parked in a temp dir beside it.
///
/// Dropping the backup deletes the parked file.
struct Backup {
    _dir: TempDir,
    saved: PathBuf,
}

impl Backup {
    /// Moves an existing file at `path` aside. `None` if nothing is there.
    fn take(path: &Path) -> IoResult<Option<Self>> {
        if std::fs::symlink_metadata(path).is_err() {
            return Ok(None);
        }
        let write_err = |source: std::io::Error| IoError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = tempfile::Builder::new()
            .prefix(".imgproc-")
            .suffix(".bak")
            .tempdir_in(parent_dir(path))
            .map_err(write_err)?;
        let saved = dir.path().join("previous");
        std::fs::rename(path, &saved).map_err(write_err)?;
        Ok(Some(Self { _dir: dir, saved }))
    }
}

fn restore(path: &Path, backup: Backup) {
    if let Err(e) = std::fs::rename(&backup.saved, path) {
        warn!(path = %path.display(), error = %e, "failed to restore previous output");
    }
}

/// Undoes committed outputs, newest first.
fn roll_back(committed: Vec<(&Path, Option<Backup>)>) {
    for (path, backup) in committed.into_iter().rev() {
        match backup {
            Some(backup) => restore(path, backup),
            None => {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to roll back output");
                }
            }
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Writes `bytes` to a temp file in the directory of `path`.
fn stage(path: &Path, bytes: &[u8]) -> IoResult<NamedTempFile> {
    let write_err = |source: std::io::Error| IoError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".imgproc-")
        .suffix(".tmp")
        .tempfile_in(parent_dir(path))
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    Ok(tmp)
}
