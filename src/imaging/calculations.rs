//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// A rectangle inside the source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// The whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
        }
    }

    /// True if the region is non-empty and lies inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.left.checked_add(self.width).is_some_and(|r| r <= width)
            && self.top.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Calculate the centered crop that matches the target aspect ratio.
///
/// The crop keeps the full source width and trims the height; if that would
/// need more height than the source has, it keeps the full height and trims
/// the width instead. Both sides are floored and never drop below 1px.
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `target` - Output dimensions (width, height)
///
/// # Examples
/// ```
/// # use image_intake::imaging::{calculate_cover_crop, CropRegion};
/// // 800x600 source, square target → 600x600 centered
/// assert_eq!(
///     calculate_cover_crop((800, 600), (100, 100)),
///     CropRegion { left: 100, top: 0, width: 600, height: 600 }
/// );
/// ```
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> CropRegion {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    let ratio = tgt_w as f64 / tgt_h as f64;

    let mut crop_w = src_w;
    let mut crop_h = (src_w as f64 / ratio).floor() as u32;
    if crop_h > src_h {
        crop_h = src_h;
        crop_w = (crop_h as f64 * ratio).floor() as u32;
    }
    let crop_w = crop_w.clamp(1, src_w.max(1));
    let crop_h = crop_h.clamp(1, src_h.max(1));

    CropRegion {
        left: (src_w - crop_w) / 2,
        top: (src_h - crop_h) / 2,
        width: crop_w,
        height: crop_h,
    }
}

/// Dimensions after shrinking to `width`, keeping the source aspect ratio.
///
/// The height is floored: `width * src_h / src_w` in integer arithmetic.
pub fn scale_to_width(source: (u32, u32), width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let h = (width as u64 * src_h as u64 / src_w.max(1) as u64) as u32;
    (width, h)
}

/// Dimensions after shrinking to `height`, keeping the source aspect ratio.
pub fn scale_to_height(source: (u32, u32), height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = (height as u64 * src_w as u64 / src_h.max(1) as u64) as u32;
    (w, height)
}
