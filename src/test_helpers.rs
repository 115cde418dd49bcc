//! Shared test utilities for the image-intake test suite.
//!
//! Synthetic images are generated in memory with the `image` crate so tests
//! never depend on fixture files. GIF and WebP containers whose byte layout
//! matters (animation detection) are assembled by hand.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let manager = real_manager();
//! let record = manager.from_bytes(png_bytes(40, 30)).unwrap();
//! assert_eq!(record.dimensions(), (40, 30));
//! ```

use crate::config::ImageConfig;
use crate::fetch::{FetchError, FetchResponse, HttpFetch};
use crate::format::ImageFormat;
use crate::imaging::{ImageBackend, RustBackend};
use crate::manager::ImageManager;
use crate::record::{ImageData, ImageRecord};
use image::{DynamicImage, Rgb, RgbImage};
use md5::{Digest, Md5};
use reqwest::Url;
use reqwest::header::HeaderName;
use std::f64::consts::PI;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// =========================================================================
// Managers
// =========================================================================

pub fn manager_with(backend: impl ImageBackend + 'static, fetcher: StubFetcher) -> ImageManager {
    manager_with_config(ImageConfig::default(), backend, fetcher)
}

pub fn manager_with_config(
    config: ImageConfig,
    backend: impl ImageBackend + 'static,
    fetcher: StubFetcher,
) -> ImageManager {
    ImageManager::builder(config)
        .backend(backend)
        .fetcher(fetcher)
        .build()
        .unwrap()
}

/// Real codecs, no network.
pub fn real_manager() -> ImageManager {
    manager_with(RustBackend::new(), StubFetcher::default())
}

// =========================================================================
// HTTP stub
// =========================================================================

type RecordedRequest = (String, Vec<(HeaderName, String)>);

/// In-memory [`HttpFetch`]: serves one body (or one error) for every request
/// and records what was asked for.
#[derive(Default)]
pub struct StubFetcher {
    pub body: Vec<u8>,
    pub declared_size: Option<u64>,
    pub error: Mutex<Option<FetchError>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubFetcher {
    /// Serve `body`, with a `Content-Length` when `declare_length` is set.
    pub fn serving(body: Vec<u8>, declare_length: bool) -> Self {
        Self {
            declared_size: declare_length.then_some(body.len() as u64),
            body,
            ..Self::default()
        }
    }

    /// Override the declared length, e.g. to lie about it.
    pub fn declaring(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            error: Mutex::new(Some(error)),
            ..Self::default()
        }
    }
}

impl HttpFetch for StubFetcher {
    fn fetch(
        &self,
        url: &Url,
        headers: &[(HeaderName, String)],
    ) -> Result<FetchResponse, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));
        if let Some(error) = self.error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(FetchResponse {
            declared_size: self.declared_size,
            body: Box::new(Cursor::new(self.body.clone())),
        })
    }
}

// =========================================================================
// Records
// =========================================================================

/// A record with the given metadata and placeholder bytes. Only useful with
/// a mock backend, the bytes are not a real image.
pub fn inline_record(format: ImageFormat, width: u32, height: u32) -> ImageRecord {
    let bytes = format!("{format}:{width}x{height}").into_bytes();
    record_with(format, (width, height), bytes)
}

/// A 1×1 record wrapping arbitrary bytes.
pub fn record_from(format: ImageFormat, bytes: &[u8]) -> ImageRecord {
    record_with(format, (1, 1), bytes.to_vec())
}

fn record_with(format: ImageFormat, dims: (u32, u32), bytes: Vec<u8>) -> ImageRecord {
    let md5: [u8; 16] = Md5::digest(&bytes).into();
    ImageRecord::new(
        bytes.len() as u64,
        format.mime_type(),
        format,
        dims,
        md5,
        ImageData::Inline(bytes),
    )
}

// =========================================================================
// Pixels
// =========================================================================

/// Red rises left to right, green top to bottom.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
        Rgb([r, g, 128])
    })
}

/// Grey image made of two half-period cosines, one per axis, with different
/// amplitudes. Its low frequencies dominate, which keeps perceptual hashes
/// well away from their thresholds.
pub fn smooth_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let fx = (PI * (f64::from(x) + 0.5) / f64::from(width)).cos();
        let fy = (PI * (f64::from(y) + 0.5) / f64::from(height)).cos();
        let v = (128.0 + 60.0 * fx + 40.0 * fy).round() as u8;
        Rgb([v, v, v])
    })
}

fn encode(image: RgbImage, format: image::ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient_image(width, height), image::ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient_image(width, height), image::ImageFormat::Jpeg)
}

pub fn smooth_png(width: u32, height: u32) -> Vec<u8> {
    encode(smooth_image(width, height), image::ImageFormat::Png)
}

// =========================================================================
// Containers
// =========================================================================

/// A 1×1 GIF with `frames` frames, each preceded by a graphic control
/// extension.
pub fn gif_bytes(frames: usize) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    // Logical screen 1x1, 2-colour global table
    bytes.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00]);
    for _ in 0..frames {
        // Graphic control extension, 100 ms delay
        bytes.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00]);
        // Image descriptor
        bytes.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        // LZW min code size 2, one data sub-block, terminator
        bytes.extend_from_slice(&[0x02, 0x02, 0x44, 0x01, 0x00]);
    }
    bytes.push(0x3B);
    bytes
}

/// The first 30 bytes of an extended WebP with the given `VP8X` flags.
pub fn webp_header(flags: u8) -> Vec<u8> {
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&22u32.to_le_bytes());
    bytes.extend_from_slice(b"WEBPVP8X");
    bytes.extend_from_slice(&10u32.to_le_bytes());
    bytes.push(flags);
    bytes.extend_from_slice(&[0x00; 3]);
    // Canvas 1x1, stored minus one
    bytes.extend_from_slice(&[0x00; 6]);
    bytes
}
