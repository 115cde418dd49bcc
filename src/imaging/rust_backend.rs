//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF, ICO) | `image` crate decoders |
//! | Resample | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `jpeg-encoder` (progressive scans supported) |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, quality picks compression effort |
//! | Encode → WebP | `webp` (lossy) with a quality hint, else lossless `image::codecs::webp::WebPEncoder` |
//! | Encode → GIF, BMP, TIFF, ICO | `DynamicImage::write_to` |
//!
//! HEIF has no decoder or encoder here: identify fails (the pipeline reports
//! `NotAnImage`) and encode fails (`EncodeFailed`).

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::CropRegion;
use super::params::{EncodeParams, Quality};
use crate::format::ImageFormat;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat as CodecFormat, ImageReader, RgbaImage};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)
}

fn codec_format(format: ImageFormat) -> Option<CodecFormat> {
    match format {
        ImageFormat::Jpeg => Some(CodecFormat::Jpeg),
        ImageFormat::Png => Some(CodecFormat::Png),
        ImageFormat::Gif => Some(CodecFormat::Gif),
        ImageFormat::Webp => Some(CodecFormat::WebP),
        ImageFormat::Bmp => Some(CodecFormat::Bmp),
        ImageFormat::Tiff => Some(CodecFormat::Tiff),
        ImageFormat::Ico => Some(CodecFormat::Ico),
        ImageFormat::Heif => None,
    }
}

/// Map the 1–100 quality hint onto PNG compression effort.
fn png_compression(quality: Option<Quality>) -> CompressionType {
    match quality.map(Quality::value) {
        None => CompressionType::Default,
        Some(q) if q <= 33 => CompressionType::Fast,
        Some(q) if q <= 66 => CompressionType::Default,
        Some(_) => CompressionType::Best,
    }
}

fn encode_jpeg(
    image: &DynamicImage,
    params: &EncodeParams,
    buf: &mut Vec<u8>,
) -> Result<(), BackendError> {
    let rgb = image.to_rgb8();
    let too_big = |side: u32| {
        BackendError::ProcessingFailed(format!("JPEG dimension {side} exceeds 65535"))
    };
    let width = u16::try_from(rgb.width()).map_err(|_| too_big(rgb.width()))?;
    let height = u16::try_from(rgb.height()).map_err(|_| too_big(rgb.height()))?;

    let quality = params.quality.unwrap_or_default().value();
    let mut encoder = jpeg_encoder::Encoder::new(buf, quality);
    encoder.set_progressive(params.progressive);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))
}

/// Lossy WebP through libwebp; the hint is its 0-100 quality factor.
fn encode_webp_lossy(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgba = image.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, f32::from(quality.value()))
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(bytes)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        reader(bytes)?
            .decode()
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))
    }

    fn resample(
        &self,
        image: &DynamicImage,
        region: CropRegion,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Empty output size {width}x{height}"
            )));
        }
        if !region.fits_within(image.width(), image.height()) {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {}x{}+{}+{} outside {}x{} image",
                region.width,
                region.height,
                region.left,
                region.top,
                image.width(),
                image.height()
            )));
        }

        let cropped = image.crop_imm(region.left, region.top, region.width, region.height);
        Ok(image::imageops::resize(
            &cropped.to_rgba8(),
            width,
            height,
            FilterType::Lanczos3,
        ))
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let failed = |e: image::ImageError| {
            BackendError::ProcessingFailed(format!("{} encode failed: {e}", params.format))
        };

        match params.format {
            ImageFormat::Jpeg => encode_jpeg(image, params, &mut buf)?,
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    png_compression(params.quality),
                    PngFilter::Adaptive,
                );
                image.write_with_encoder(encoder).map_err(failed)?;
            }
            ImageFormat::Webp => match params.quality {
                Some(quality) => buf = encode_webp_lossy(image, quality)?,
                None => {
                    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
                        .map_err(failed)?;
                }
            },
            other => {
                let codec = codec_format(other).ok_or_else(|| {
                    BackendError::ProcessingFailed(format!("No {other} encoder compiled in"))
                })?;
                image
                    .write_to(&mut Cursor::new(&mut buf), codec)
                    .map_err(failed)?;
            }
        }

        Ok(buf)
    }
}
