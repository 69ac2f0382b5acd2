//! Allowed image encodings, as named in settings (`jpeg`, `png`, ...).

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
}

/// Formats accepted when none are configured.
pub const DEFAULT_KINDS: &[ImageKind] = &[ImageKind::Jpeg, ImageKind::Png];

impl ImageKind {
    pub const ALL: [ImageKind; 6] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::Webp,
        ImageKind::Bmp,
        ImageKind::Tiff,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
            ImageKind::Bmp => "bmp",
            ImageKind::Tiff => "tiff",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::Webp => ImageFormat::WebP,
            ImageKind::Bmp => ImageFormat::Bmp,
            ImageKind::Tiff => ImageFormat::Tiff,
        }
    }

    /// Maps a sniffed format back to a kind; `None` for encodings we never accept.
    pub fn from_image_format(format: ImageFormat) -> Option<ImageKind> {
        ImageKind::ALL
            .into_iter()
            .find(|k| k.image_format() == format)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type {0:?} (expected one of: jpeg, png, gif, webp, bmp, tiff)")]
pub struct ParseKindError(pub String);

impl FromStr for ImageKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "jpg" {
            return Ok(ImageKind::Jpeg);
        }
        ImageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}
