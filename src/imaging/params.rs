//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`transform`](crate::transform) engine (which decides
//! crop, canvas and format) and the [`backend`](super::backend) (which does the
//! actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing the engine.
//!
//! ## Types
//!
//! - [`Quality`]: encoder quality hint (1–100, default 90). Clamped on construction.
//! - [`TransformParams`]: a whole conversion (format, output size, optional quality).
//! - [`EncodeParams`]: what the backend needs to encode a finished canvas.

use crate::format::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a resize/crop/encode conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub quality: Option<Quality>,
}

/// Parameters for encoding a finished canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: ImageFormat,
    /// Only set when the caller asked for one and the format accepts it.
    pub quality: Option<Quality>,
    /// Progressive scan order (JPEG only).
    pub progressive: bool,
}
