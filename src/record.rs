//! The validated image record.
//!
//! An [`ImageRecord`] is only ever produced by the pipeline after every
//! validation step has passed, so holding one means: the bytes sniff as a
//! known MIME type, the format is allowed, the dimensions were decoded from
//! the bytes and are within limits, and the MD5 digest matches the bytes.
//!
//! Records never change. An edit produces a new record.

use crate::format::ImageFormat;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::path::{Path, PathBuf};

/// Where the image bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// Bytes on durable storage. The path is borrowed from the caller's
    /// storage; the record does not own or delete the file.
    File(PathBuf),
    /// Bytes owned by the record.
    Inline(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    size: u64,
    mime_type: &'static str,
    format: ImageFormat,
    width: u32,
    height: u32,
    md5: [u8; 16],
    name: String,
    data: ImageData,
}

impl ImageRecord {
    pub(crate) fn new(
        size: u64,
        mime_type: &'static str,
        format: ImageFormat,
        (width, height): (u32, u32),
        md5: [u8; 16],
        data: ImageData,
    ) -> Self {
        Self {
            size,
            mime_type,
            format,
            width,
            height,
            md5,
            name: derive_name(&md5),
            data,
        }
    }

    /// Same metadata, bytes now living at `path`.
    pub(crate) fn relocated(&self, path: PathBuf) -> Self {
        Self {
            data: ImageData::File(path),
            ..self.clone()
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw 16-byte MD5 digest of the image bytes.
    pub fn md5(&self) -> &[u8; 16] {
        &self.md5
    }

    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }

    /// Stable identifier: the MD5 digest as URL-safe base64 without padding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier plus extension, e.g. `1B2M2Y8AsgTpgAmY7PhCfg.png`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    pub fn file_path(&self) -> Option<&Path> {
        match &self.data {
            ImageData::File(path) => Some(path),
            ImageData::Inline(_) => None,
        }
    }

    pub fn inline_data(&self) -> Option<&[u8]> {
        match &self.data {
            ImageData::File(_) => None,
            ImageData::Inline(bytes) => Some(bytes),
        }
    }
}

fn derive_name(md5: &[u8; 16]) -> String {
    URL_SAFE_NO_PAD.encode(md5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use md5::{Digest, Md5};

    fn record_for(bytes: &[u8]) -> ImageRecord {
        let md5: [u8; 16] = Md5::digest(bytes).into();
        ImageRecord::new(
            bytes.len() as u64,
            "image/png",
            ImageFormat::Png,
            (4, 3),
            md5,
            ImageData::Inline(bytes.to_vec()),
        )
    }

    #[test]
    fn name_is_url_safe_base64_without_padding() {
        let record = record_for(b"");
        // MD5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(record.md5_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(record.name(), "1B2M2Y8AsgTpgAmY7PhCfg");
        assert_eq!(record.name().len(), 22);
        assert!(!record.name().contains(['+', '/', '=']));
    }

    #[test]
    fn name_is_deterministic_and_content_sensitive() {
        let a = record_for(b"same bytes");
        let b = record_for(b"same bytes");
        let c = record_for(b"same bytez");
        assert_eq!(a.name(), b.name());
        assert_ne!(a.name(), c.name());
    }

    #[test]
    fn full_name_appends_extension() {
        let record = record_for(b"");
        assert_eq!(record.full_name(), "1B2M2Y8AsgTpgAmY7PhCfg.png");
    }

    #[test]
    fn inline_record_has_no_path() {
        let record = record_for(b"abc");
        assert_eq!(record.inline_data(), Some(&b"abc"[..]));
        assert!(record.file_path().is_none());
    }

    #[test]
    fn relocated_record_keeps_metadata() {
        let record = record_for(b"abc");
        let moved = record.relocated(PathBuf::from("/store/x.png"));
        assert_eq!(moved.file_path(), Some(Path::new("/store/x.png")));
        assert!(moved.inline_data().is_none());
        assert_eq!(moved.md5(), record.md5());
        assert_eq!(moved.name(), record.name());
        assert_eq!(moved.dimensions(), (4, 3));
    }
}
