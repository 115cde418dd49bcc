//! Error taxonomy for the ingestion, transform and hashing pipeline.
//!
//! Every validation failure is raised eagerly, before a record is built, and
//! carries the offending value so callers can report it without re-deriving
//! anything. Collaborator errors ([`BackendError`](crate::imaging::BackendError),
//! [`FetchError`](crate::fetch::FetchError), `std::io::Error`) are wrapped at
//! the call site into the kind that describes *which stage* failed.

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::format::ImageFormat;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which edit dimension a range error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => f.write_str("width"),
            Self::Height => f.write_str("height"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("The file is too big: {size} bytes, max is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("Mime type \"{0}\" is not supported")]
    UnsupportedMime(String),
    #[error("Type \"{0}\" is not supported")]
    UnsupportedType(ImageFormat),
    #[error("The file must be an image: {0}")]
    NotAnImage(String),
    #[error("Max resolution is {max_width}x{max_height}, {width}x{height} given")]
    ResolutionTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("The file does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("The file must be readable: {}", .0.display())]
    NotReadable(PathBuf),
    #[error("Invalid URL: {0}")]
    InvalidPath(String),
    #[error("Can't load the image from {url}: {source}")]
    ReadFailed {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("Can't write {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },
    #[error("{dimension} must be between 1 and {max} px, {value} given")]
    DimensionOutOfRange {
        dimension: Dimension,
        value: u32,
        max: u32,
    },
    #[error("Unable to resize image: {0}")]
    ResizeFailed(String),
    #[error("Unable to encode {format}: {reason}")]
    EncodeFailed { format: ImageFormat, reason: String },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ImageError>;
