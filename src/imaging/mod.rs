//! Image processing: the pixel layer under the pipeline.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` crate decoders |
//! | **Resample** | crop + Lanczos3 `imageops::resize` |
//! | **Encode** | `jpeg-encoder` (progressive JPEG), `image` encoders for the rest |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and aspect math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{CropRegion, calculate_cover_crop, scale_to_height, scale_to_width};
pub use params::{EncodeParams, Quality, TransformParams};
pub use rust_backend::RustBackend;
