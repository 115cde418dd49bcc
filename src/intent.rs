//! Edit intents.
//!
//! An [`EditIntent`] describes what should change about one source record.
//! It is a value-style builder: every setter consumes the intent and returns
//! it, so intents are built in a single expression:
//!
//! ```
//! # use image_intake::{EditIntent, ImageFormat, ImageRecord};
//! # fn demo(record: &ImageRecord) {
//! let intent = EditIntent::new(record)
//!     .format(Some(ImageFormat::Webp))
//!     .max_width(1200)
//!     .quality(Some(80));
//! # }
//! ```
//!
//! Nothing is validated here; range and allow-list checks happen in
//! [`ImageManager::convert_to`](crate::ImageManager::convert_to).

use crate::format::ImageFormat;
use crate::imaging::{scale_to_height, scale_to_width};
use crate::record::ImageRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditIntent<'a> {
    source: &'a ImageRecord,
    new_format: Option<ImageFormat>,
    new_width: Option<u32>,
    new_height: Option<u32>,
    quality: Option<u8>,
}

impl<'a> EditIntent<'a> {
    pub fn new(source: &'a ImageRecord) -> Self {
        Self {
            source,
            new_format: None,
            new_width: None,
            new_height: None,
            quality: None,
        }
    }

    /// Target format. Asking for the source's own format is not a change.
    pub fn format(mut self, format: Option<ImageFormat>) -> Self {
        self.new_format = format.filter(|f| *f != self.source.format());
        self
    }

    pub fn width(mut self, width: Option<u32>) -> Self {
        self.new_width = width;
        self
    }

    pub fn height(mut self, height: Option<u32>) -> Self {
        self.new_height = height;
        self
    }

    /// Shrink to `width` if the source is wider, keeping the aspect ratio.
    /// Does nothing when the source already fits.
    pub fn max_width(mut self, width: u32) -> Self {
        if width < self.source.width() {
            let (w, h) = scale_to_width(self.source.dimensions(), width);
            self.new_width = Some(w);
            self.new_height = Some(h);
        }
        self
    }

    /// Shrink to `height` if the source is taller, keeping the aspect ratio.
    /// Does nothing when the source already fits.
    pub fn max_height(mut self, height: u32) -> Self {
        if height < self.source.height() {
            let (w, h) = scale_to_height(self.source.dimensions(), height);
            self.new_width = Some(w);
            self.new_height = Some(h);
        }
        self
    }

    pub fn quality(mut self, quality: Option<u8>) -> Self {
        self.quality = quality;
        self
    }

    pub fn source(&self) -> &'a ImageRecord {
        self.source
    }

    pub fn new_format(&self) -> Option<ImageFormat> {
        self.new_format
    }

    pub fn new_width(&self) -> Option<u32> {
        self.new_width
    }

    pub fn new_height(&self) -> Option<u32> {
        self.new_height
    }

    pub fn quality_hint(&self) -> Option<u8> {
        self.quality
    }

    pub fn is_changed(&self) -> bool {
        self.new_format.is_some()
            || self.new_width.is_some()
            || self.new_height.is_some()
            || self.quality.is_some()
    }
}
