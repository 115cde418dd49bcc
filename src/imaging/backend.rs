//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four pixel operations the pipeline
//! delegates: identify, decode, resample and encode. Validation, crop math,
//! alpha flattening and hashing all sit above it and never touch a codec.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::calculations::CropRegion;
use super::params::EncodeParams;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must keep the alpha channel through `decode` and
/// `resample`; the transform engine decides whether to flatten it.
pub trait ImageBackend: Send + Sync {
    /// Read the pixel dimensions without decoding the full image.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode to pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample `region` of `image` into a `width × height` RGBA buffer.
    fn resample(
        &self,
        image: &DynamicImage,
        region: CropRegion,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError>;

    /// Encode a finished canvas.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}

/// Lets several managers share one backend.
impl<T: ImageBackend + ?Sized> ImageBackend for Arc<T> {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        (**self).identify(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        (**self).decode(bytes)
    }

    fn resample(
        &self,
        image: &DynamicImage,
        region: CropRegion,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        (**self).resample(image, region, width, height)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        (**self).encode(image, params)
    }
}
