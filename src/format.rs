//! Image formats and the MIME table.
//!
//! The format is a closed enum; everything that used to be keyed by a format
//! *string* (encoder selection, quality support, alpha handling) is a `match`
//! on [`ImageFormat`] so a missing arm is a compile error.
//!
//! | MIME type | Format |
//! |---|---|
//! | `image/jpeg`, `image/pjpeg` | [`ImageFormat::Jpeg`] |
//! | `image/png` | [`ImageFormat::Png`] |
//! | `image/gif` | [`ImageFormat::Gif`] |
//! | `image/webp` | [`ImageFormat::Webp`] |
//! | `image/bmp`, `image/x-ms-bmp` | [`ImageFormat::Bmp`] |
//! | `image/tiff` | [`ImageFormat::Tiff`] |
//! | `image/x-icon`, `image/vnd.microsoft.icon` | [`ImageFormat::Ico`] |
//! | `image/heif` | [`ImageFormat::Heif`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Ico,
    Heif,
}

/// Known MIME types. The first entry for a format is its canonical MIME type.
const MIME_TYPES: &[(&str, ImageFormat)] = &[
    ("image/png", ImageFormat::Png),
    ("image/gif", ImageFormat::Gif),
    ("image/webp", ImageFormat::Webp),
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/pjpeg", ImageFormat::Jpeg),
    ("image/bmp", ImageFormat::Bmp),
    ("image/x-ms-bmp", ImageFormat::Bmp),
    ("image/tiff", ImageFormat::Tiff),
    ("image/x-icon", ImageFormat::Ico),
    ("image/vnd.microsoft.icon", ImageFormat::Ico),
    ("image/heif", ImageFormat::Heif),
];

impl ImageFormat {
    pub const ALL: [ImageFormat; 8] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Webp,
        Self::Bmp,
        Self::Tiff,
        Self::Ico,
        Self::Heif,
    ];

    /// Look up a format by MIME type. Returns the table's own `&'static str`
    /// so records never allocate for their MIME type.
    pub fn from_mime(mime: &str) -> Option<(&'static str, ImageFormat)> {
        MIME_TYPES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(mime))
            .copied()
    }

    /// Canonical MIME type for this format.
    pub fn mime_type(self) -> &'static str {
        MIME_TYPES
            .iter()
            .find(|(_, format)| *format == self)
            .map(|(mime, _)| *mime)
            .unwrap_or("application/octet-stream")
    }

    /// Lowercase name, also used as the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Ico => "ico",
            Self::Heif => "heif",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// Whether the encoder accepts a quality hint.
    pub fn supports_quality(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Webp)
    }

    /// Whether transformed output keeps an alpha channel instead of being
    /// flattened onto the background colour.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            "tiff" | "tif" => Ok(Self::Tiff),
            "ico" => Ok(Self::Ico),
            "heif" | "heic" => Ok(Self::Heif),
            other => Err(format!("unknown image format: {other}")),
        }
    }
}
