//! Content-based image validation.
//!
//! Works on local files only. The encoding is sniffed from the leading bytes
//! (the filename is never consulted) and the bytes must decode cleanly, so an
//! HTML error page or a truncated JPEG behind an `.jpg` URL is rejected.
//! Missing or unreadable files are errors, not rejections.

mod format;
mod orientation;

pub use format::{ImageKind, ParseKindError, DEFAULT_KINDS};
pub use orientation::{Orientation, ParseOrientationError};

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Checks downloaded files against the allowed formats and orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentValidator {
    allowed: BTreeSet<ImageKind>,
    orientation: Orientation,
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new(DEFAULT_KINDS.iter().copied(), Orientation::Both)
    }
}

impl ContentValidator {
    pub fn new(allowed: impl IntoIterator<Item = ImageKind>, orientation: Orientation) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            orientation,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sniffed format of `path`, or `None` when it is not a recognised image.
    pub fn detect(&self, path: &Path) -> Result<Option<ImageKind>> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Ok(sniff(&bytes))
    }

    /// True iff `path` holds a complete image in one of the allowed formats.
    pub fn is_image(&self, path: &Path) -> Result<bool> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let Some(kind) = sniff(&bytes) else {
            tracing::debug!(path = %path.display(), "no image signature");
            return Ok(false);
        };
        if !self.allowed.contains(&kind) {
            tracing::debug!(path = %path.display(), %kind, "format not allowed");
            return Ok(false);
        }
        if let Err(e) = image::load_from_memory_with_format(&bytes, kind.image_format()) {
            tracing::debug!(path = %path.display(), %kind, "decode failed: {}", e);
            return Ok(false);
        }
        // Some decoders pad a short scan with grey instead of failing.
        if !has_end_marker(kind, &bytes) {
            tracing::debug!(path = %path.display(), %kind, "missing end marker, truncated");
            return Ok(false);
        }
        Ok(true)
    }

    /// True iff the image's pixel dimensions satisfy the configured orientation.
    pub fn is_orientation_ok(&self, path: &Path) -> Result<bool> {
        let (width, height) = dimensions(path)?;
        Ok(self.orientation.accepts(width, height))
    }

    /// True iff width is strictly greater than height.
    pub fn is_landscape_image(&self, path: &Path) -> Result<bool> {
        let (width, height) = dimensions(path)?;
        Ok(width > height)
    }
}

fn sniff(bytes: &[u8]) -> Option<ImageKind> {
    image::guess_format(bytes)
        .ok()
        .and_then(ImageKind::from_image_format)
}

/// JPEG must close with EOI and PNG with its IEND chunk. Trailing NUL padding
/// after the marker is tolerated.
fn has_end_marker(kind: ImageKind, bytes: &[u8]) -> bool {
    const JPEG_EOI: &[u8] = &[0xFF, 0xD9];
    const PNG_IEND: &[u8] = &[b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let bytes = &bytes[..end];
    match kind {
        ImageKind::Jpeg => bytes.ends_with(JPEG_EOI),
        ImageKind::Png => bytes.ends_with(PNG_IEND),
        _ => true,
    }
}

/// Pixel size, with the decoder chosen from the leading bytes. Transient
/// files carry no image extension.
fn dimensions(path: &Path) -> Result<(u32, u32)> {
    let read = || -> image::ImageResult<(u32, u32)> {
        image::ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
    };
    read().with_context(|| format!("read dimensions of {}", path.display()))
}
