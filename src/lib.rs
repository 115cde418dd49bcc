//! # Image Intake
//!
//! Ingest images from bytes, files, data URLs and remote URLs; validate them
//! against a configurable policy; convert them with a cover-fit crop; and
//! fingerprint them with content digests and perceptual hashes.
//!
//! # Architecture: Record → Intent → Record
//!
//! ```text
//! 1. Ingest     bytes | file | data: | http(s)  →  ImageRecord   (validated)
//! 2. Describe   ImageRecord                     →  EditIntent    (format, size, quality)
//! 3. Convert    EditIntent                      →  ImageRecord   (new inline record)
//! 4. Persist    ImageRecord                     →  ImageRecord   (file-backed copy)
//! ```
//!
//! An [`ImageRecord`] is immutable once built: every record that exists has
//! passed validation, and its MD5 always matches its bytes. All stages are
//! methods on [`ImageManager`], which owns the configuration and the
//! collaborators (imaging backend, filesystem, HTTP client) behind traits, so
//! unit tests swap in mocks without touching the disk or the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manager`] | The [`ImageManager`] façade and its builder |
//! | [`ingest`] | Validation and the four ingestion entry points, plus `save_to` |
//! | [`intent`] | [`EditIntent`] builder: requested format, dimensions, quality |
//! | [`transform`] | Cover-fit resample and re-encode; `convert_to` |
//! | [`perceptual`] | Hand-rolled 64-bit DCT hash and Hamming distance |
//! | [`hashing`] | Named hash registry: perceptual hashes and content digests |
//! | [`animation`] | Animated GIF / WebP detection from container bytes |
//! | [`imaging`] | Pixel layer: backend trait, `image`-crate backend, crop math |
//! | [`record`] | [`ImageRecord`] and its backing [`ImageData`] |
//! | [`format`] | Closed [`ImageFormat`] enum and the MIME table |
//! | [`config`] | TOML configuration, defaults and validation |
//! | [`fetch`] | HTTP seam and the blocking `reqwest` client |
//! | [`storage`] | Filesystem seam |
//! | [`output`] | CLI output formatting |
//! | [`error`] | [`ImageError`] |
//!
//! # Design Decisions
//!
//! ## Sniff, Don't Trust
//!
//! Formats are identified from magic bytes, never from file extensions or
//! `Content-Type` headers. The sniffed MIME type picks the [`ImageFormat`];
//! the configured allow-list then decides whether that format is accepted,
//! and finally the codec must be able to read the dimensions. A PNG renamed
//! to `.jpg` is a PNG.
//!
//! ## Cover-Fit Only
//!
//! Conversions crop to the target aspect ratio around the centre before
//! scaling, so the output canvas is always filled. There is no letterboxing
//! and no distortion. A dimension left unset keeps the source's value; the
//! `max_width`/`max_height` constraints scale both sides proportionally.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding use the `image` crate, with
//! `jpeg-encoder` for progressive JPEG. No system libraries are needed.

pub mod animation;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod hashing;
pub mod imaging;
pub mod ingest;
pub mod intent;
pub mod manager;
pub mod output;
pub mod perceptual;
pub mod record;
pub mod storage;
pub mod transform;

pub use config::ImageConfig;
pub use error::{ImageError, Result};
pub use format::ImageFormat;
pub use hashing::HashAlgorithm;
pub use intent::EditIntent;
pub use manager::{ImageManager, ImageManagerBuilder};
pub use record::{ImageData, ImageRecord};

#[cfg(test)]
pub(crate) mod test_helpers;
