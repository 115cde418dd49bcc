//! Cover-fit conversion.
//!
//! [`ImageManager::transform`] produces encoded bytes for a fixed output size:
//!
//! 1. Decode the source pixels.
//! 2. Crop the largest centred region with the target aspect ratio
//!    ([`calculate_cover_crop`]).
//! 3. Resample the region to the target size (Lanczos3).
//! 4. Formats with alpha keep the RGBA result; every other format is
//!    composited onto an opaque canvas filled with the background colour.
//! 5. Encode. JPEG is progressive when configured; the quality hint is only
//!    forwarded to encoders that take one.
//!
//! [`ImageManager::convert_to`] validates an [`EditIntent`] against the
//! configured limits, runs the transform and wraps the result in a new record.
//! An unchanged intent short-circuits to the source record itself.

use crate::error::{Dimension, ImageError, Result};
use crate::format::ImageFormat;
use crate::imaging::{EncodeParams, Quality, TransformParams, calculate_cover_crop};
use crate::intent::EditIntent;
use crate::manager::ImageManager;
use crate::record::{ImageData, ImageRecord};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use log::debug;
use md5::{Digest, Md5};
use std::borrow::Cow;

impl ImageManager {
    /// Crop-to-fill, resample and encode `source` as described by `params`.
    ///
    /// Output bounds are not checked here; see [`convert_to`](Self::convert_to).
    pub fn transform(&self, source: &ImageRecord, params: &TransformParams) -> Result<Vec<u8>> {
        let image = self.decode(source)?;

        let region = calculate_cover_crop(
            (image.width(), image.height()),
            (params.width, params.height),
        );
        debug!(
            "Cover crop {}x{}+{}+{} of {}x{} → {}x{}",
            region.width,
            region.height,
            region.left,
            region.top,
            image.width(),
            image.height(),
            params.width,
            params.height
        );

        let resampled = self
            .backend
            .resample(&image, region, params.width, params.height)
            .map_err(|e| ImageError::ResizeFailed(e.to_string()))?;
        drop(image);

        let canvas = if params.format.supports_alpha() {
            DynamicImage::ImageRgba8(resampled)
        } else {
            DynamicImage::ImageRgb8(flatten_onto(&resampled, self.config.transform.background))
        };

        let encode = EncodeParams {
            format: params.format,
            quality: params.quality.filter(|_| params.format.supports_quality()),
            progressive: params.format == ImageFormat::Jpeg
                && self.config.transform.progressive_jpeg,
        };
        self.backend
            .encode(&canvas, &encode)
            .map_err(|e| ImageError::EncodeFailed {
                format: params.format,
                reason: e.to_string(),
            })
    }

    /// Apply an edit intent.
    ///
    /// Returns the source record itself (borrowed) when the intent changes
    /// nothing, otherwise a new inline record for the converted bytes.
    pub fn convert_to<'a>(&self, intent: &EditIntent<'a>) -> Result<Cow<'a, ImageRecord>> {
        let source = intent.source();
        if !intent.is_changed() {
            return Ok(Cow::Borrowed(source));
        }

        if let Some(format) = intent.new_format() {
            if !self.config.is_type_supported(format) {
                return Err(ImageError::UnsupportedType(format));
            }
        }
        if let Some(height) = intent.new_height() {
            check_range(Dimension::Height, height, self.config.max_height)?;
        }
        if let Some(width) = intent.new_width() {
            check_range(Dimension::Width, width, self.config.max_width)?;
        }

        let params = TransformParams {
            format: intent.new_format().unwrap_or(source.format()),
            width: intent.new_width().unwrap_or(source.width()),
            height: intent.new_height().unwrap_or(source.height()),
            quality: intent.quality_hint().map(Quality::new),
        };
        let bytes = self.transform(source, &params)?;
        debug!(
            "Converted {} to {} {}x{} ({} bytes)",
            source.name(),
            params.format,
            params.width,
            params.height,
            bytes.len()
        );

        let md5: [u8; 16] = Md5::digest(&bytes).into();
        Ok(Cow::Owned(ImageRecord::new(
            bytes.len() as u64,
            params.format.mime_type(),
            params.format,
            (params.width, params.height),
            md5,
            ImageData::Inline(bytes),
        )))
    }
}

fn check_range(dimension: Dimension, value: u32, max: u32) -> Result<()> {
    if value < 1 || value > max {
        return Err(ImageError::DimensionOutOfRange {
            dimension,
            value,
            max,
        });
    }
    Ok(())
}

/// Alpha-composite `rgba` over an opaque `background`.
fn flatten_onto(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let mix = |fg: u8, bg: u8| ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8;
        Rgb([
            mix(r, background[0]),
            mix(g, background[1]),
            mix(b, background[2]),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{CropRegion, RustBackend};
    use crate::test_helpers::{StubFetcher, inline_record, manager_with, manager_with_config, png_bytes};
    use image::Rgba;
    use std::sync::Arc;

    fn mock_manager(width: u32, height: u32) -> (Arc<MockBackend>, ImageManager) {
        let backend = Arc::new(MockBackend::decoding_to(width, height));
        let manager = manager_with(backend.clone(), StubFetcher::default());
        (backend, manager)
    }

    fn encode_op(ops: &[RecordedOp]) -> &RecordedOp {
        ops.iter()
            .find(|op| matches!(op, RecordedOp::Encode { .. }))
            .expect("no encode recorded")
    }

    // =========================================================================
    // transform
    // =========================================================================

    #[test]
    fn transform_crops_center_then_resamples() {
        let (backend, manager) = mock_manager(800, 600);
        let source = inline_record(ImageFormat::Jpeg, 800, 600);
        let params = TransformParams {
            format: ImageFormat::Jpeg,
            width: 100,
            height: 100,
            quality: None,
        };
        let bytes = manager.transform(&source, &params).unwrap();
        assert_eq!(bytes, b"jpeg:100x100");

        let ops = backend.get_operations();
        assert_eq!(
            ops[1],
            RecordedOp::Resample {
                region: CropRegion {
                    left: 100,
                    top: 0,
                    width: 600,
                    height: 600,
                },
                width: 100,
                height: 100,
            }
        );
    }

    #[test]
    fn opaque_formats_are_flattened() {
        let (backend, manager) = mock_manager(40, 40);
        let source = inline_record(ImageFormat::Png, 40, 40);
        for format in [ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::Bmp] {
            let params = TransformParams {
                format,
                width: 10,
                height: 10,
                quality: None,
            };
            manager.transform(&source, &params).unwrap();
        }
        for format in [ImageFormat::Png, ImageFormat::Webp] {
            let params = TransformParams {
                format,
                width: 10,
                height: 10,
                quality: None,
            };
            manager.transform(&source, &params).unwrap();
        }

        let alpha: Vec<(ImageFormat, bool)> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Encode {
                    format, has_alpha, ..
                } => Some((format, has_alpha)),
                _ => None,
            })
            .collect();
        assert_eq!(
            alpha,
            vec![
                (ImageFormat::Jpeg, false),
                (ImageFormat::Gif, false),
                (ImageFormat::Bmp, false),
                (ImageFormat::Png, true),
                (ImageFormat::Webp, true),
            ]
        );
    }

    #[test]
    fn quality_only_reaches_formats_that_accept_it() {
        let (backend, manager) = mock_manager(20, 20);
        let source = inline_record(ImageFormat::Png, 20, 20);
        for format in [ImageFormat::Gif, ImageFormat::Jpeg, ImageFormat::Png] {
            let params = TransformParams {
                format,
                width: 20,
                height: 20,
                quality: Some(Quality::new(70)),
            };
            manager.transform(&source, &params).unwrap();
        }

        let qualities: Vec<Option<u8>> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Encode { quality, .. } => Some(quality),
                _ => None,
            })
            .collect();
        assert_eq!(qualities, vec![None, Some(70), Some(70)]);
    }

    #[test]
    fn only_jpeg_is_progressive() {
        let (backend, manager) = mock_manager(20, 20);
        let source = inline_record(ImageFormat::Png, 20, 20);
        for format in [ImageFormat::Jpeg, ImageFormat::Png] {
            let params = TransformParams {
                format,
                width: 20,
                height: 20,
                quality: None,
            };
            manager.transform(&source, &params).unwrap();
        }
        let progressive: Vec<bool> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Encode { progressive, .. } => Some(progressive),
                _ => None,
            })
            .collect();
        assert_eq!(progressive, vec![true, false]);
    }

    #[test]
    fn progressive_jpeg_can_be_disabled() {
        let mut config = ImageConfig::default();
        config.transform.progressive_jpeg = false;
        let backend = Arc::new(MockBackend::decoding_to(10, 10));
        let manager = manager_with_config(config, backend.clone(), StubFetcher::default());
        let source = inline_record(ImageFormat::Png, 10, 10);
        let params = TransformParams {
            format: ImageFormat::Jpeg,
            width: 10,
            height: 10,
            quality: None,
        };
        manager.transform(&source, &params).unwrap();
        let ops = backend.get_operations();
        assert!(matches!(
            encode_op(&ops),
            RecordedOp::Encode {
                progressive: false,
                ..
            }
        ));
    }

    #[test]
    fn resample_failure_is_resize_failed() {
        let backend = MockBackend {
            fail_resample: true,
            ..MockBackend::decoding_to(10, 10)
        };
        let manager = manager_with(backend, StubFetcher::default());
        let source = inline_record(ImageFormat::Png, 10, 10);
        let params = TransformParams {
            format: ImageFormat::Png,
            width: 5,
            height: 5,
            quality: None,
        };
        assert!(matches!(
            manager.transform(&source, &params),
            Err(ImageError::ResizeFailed(_))
        ));
    }

    #[test]
    fn encode_failure_names_the_format() {
        let backend = MockBackend {
            fail_encode: true,
            ..MockBackend::decoding_to(10, 10)
        };
        let manager = manager_with(backend, StubFetcher::default());
        let source = inline_record(ImageFormat::Png, 10, 10);
        let params = TransformParams {
            format: ImageFormat::Webp,
            width: 5,
            height: 5,
            quality: None,
        };
        assert!(matches!(
            manager.transform(&source, &params),
            Err(ImageError::EncodeFailed {
                format: ImageFormat::Webp,
                ..
            })
        ));
    }

    #[test]
    fn transparent_png_to_jpeg_lands_on_background() {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let manager = manager_with(RustBackend::new(), StubFetcher::default());
        let source = manager.from_bytes(png).unwrap();
        let intent = EditIntent::new(&source).format(Some(ImageFormat::Jpeg));
        let converted = manager.convert_to(&intent).unwrap();

        let decoded = image::load_from_memory(converted.inline_data().unwrap())
            .unwrap()
            .to_rgb8();
        let pixel = decoded.get_pixel(8, 8).0;
        assert!(pixel.iter().all(|&c| c >= 245), "{pixel:?}");
    }

    #[test]
    fn flatten_blends_by_alpha() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto(&rgba, [255, 255, 255]);
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);

        let opaque = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_onto(&opaque, [255, 0, 0]).get_pixel(0, 0).0, [10, 20, 30]);
    }

    // =========================================================================
    // convert_to
    // =========================================================================

    #[test]
    fn unchanged_intent_returns_the_source() {
        let (backend, manager) = mock_manager(10, 10);
        let source = inline_record(ImageFormat::Png, 10, 10);
        let intent = EditIntent::new(&source).format(Some(ImageFormat::Png));

        let result = manager.convert_to(&intent).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert!(std::ptr::eq(result.as_ref(), &source));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn disallowed_target_format() {
        let (_, manager) = mock_manager(10, 10);
        let source = inline_record(ImageFormat::Png, 10, 10);
        let intent = EditIntent::new(&source).format(Some(ImageFormat::Tiff));
        assert!(matches!(
            manager.convert_to(&intent),
            Err(ImageError::UnsupportedType(ImageFormat::Tiff))
        ));
    }

    #[test]
    fn height_is_checked_before_width() {
        let (_, manager) = mock_manager(10, 10);
        let source = inline_record(ImageFormat::Png, 10, 10);
        let intent = EditIntent::new(&source).width(Some(0)).height(Some(0));
        assert!(matches!(
            manager.convert_to(&intent),
            Err(ImageError::DimensionOutOfRange {
                dimension: Dimension::Height,
                value: 0,
                ..
            })
        ));
    }

    #[test]
    fn width_over_limit() {
        let (_, manager) = mock_manager(10, 10);
        let source = inline_record(ImageFormat::Png, 10, 10);
        let intent = EditIntent::new(&source).width(Some(10_001));
        assert!(matches!(
            manager.convert_to(&intent),
            Err(ImageError::DimensionOutOfRange {
                dimension: Dimension::Width,
                value: 10_001,
                max: 10_000,
            })
        ));
    }

    #[test]
    fn degenerate_max_constraint_is_rejected() {
        // 1000x1 → max_width 500 → height floors to 0
        let (_, manager) = mock_manager(1000, 1);
        let source = inline_record(ImageFormat::Png, 1000, 1);
        let intent = EditIntent::new(&source).max_width(500);
        assert!(matches!(
            manager.convert_to(&intent),
            Err(ImageError::DimensionOutOfRange {
                dimension: Dimension::Height,
                value: 0,
                ..
            })
        ));
    }

    #[test]
    fn converted_record_describes_new_bytes() {
        let (_, manager) = mock_manager(800, 600);
        let source = inline_record(ImageFormat::Png, 800, 600);
        let intent = EditIntent::new(&source)
            .format(Some(ImageFormat::Jpeg))
            .max_width(400);

        let converted = manager.convert_to(&intent).unwrap().into_owned();
        let expected_md5: [u8; 16] = Md5::digest(b"jpeg:400x300").into();
        assert_eq!(converted.format(), ImageFormat::Jpeg);
        assert_eq!(converted.mime_type(), "image/jpeg");
        assert_eq!(converted.dimensions(), (400, 300));
        assert_eq!(converted.size(), 12);
        assert_eq!(converted.md5(), &expected_md5);
        assert_eq!(converted.inline_data(), Some(&b"jpeg:400x300"[..]));
    }

    #[test]
    fn quality_only_intent_keeps_format_and_size() {
        let (backend, manager) = mock_manager(64, 32);
        let source = inline_record(ImageFormat::Jpeg, 64, 32);
        let intent = EditIntent::new(&source).quality(Some(40));
        let converted = manager.convert_to(&intent).unwrap();

        assert_eq!(converted.format(), ImageFormat::Jpeg);
        assert_eq!(converted.dimensions(), (64, 32));
        let ops = backend.get_operations();
        assert!(matches!(
            encode_op(&ops),
            RecordedOp::Encode {
                quality: Some(40),
                width: 64,
                height: 32,
                ..
            }
        ));
    }

    #[test]
    fn real_conversion_produces_decodable_image() {
        let manager = manager_with(RustBackend::new(), StubFetcher::default());
        let source = manager.from_bytes(png_bytes(120, 80)).unwrap();
        let intent = EditIntent::new(&source)
            .format(Some(ImageFormat::Webp))
            .width(Some(30))
            .height(Some(30));
        let converted = manager.convert_to(&intent).unwrap().into_owned();

        let reingested = manager
            .from_bytes(converted.inline_data().unwrap().to_vec())
            .unwrap();
        assert_eq!(reingested.format(), ImageFormat::Webp);
        assert_eq!(reingested.dimensions(), (30, 30));
        assert_eq!(reingested.md5(), converted.md5());
    }

    #[test]
    fn webp_quality_hint_changes_output() {
        let manager = manager_with(RustBackend::new(), StubFetcher::default());
        let source = manager.from_bytes(png_bytes(128, 128)).unwrap();
        let convert = |quality: u8| {
            let intent = EditIntent::new(&source)
                .format(Some(ImageFormat::Webp))
                .quality(Some(quality));
            manager.convert_to(&intent).unwrap().into_owned()
        };
        let low = convert(10);
        let high = convert(95);

        assert_ne!(low.md5(), high.md5());
        assert!(low.size() < high.size());
        assert_eq!(low.dimensions(), (128, 128));
    }
}
