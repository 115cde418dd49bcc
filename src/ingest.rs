//! Ingestion: turning untrusted bytes into validated [`ImageRecord`]s.
//!
//! Every entry point funnels into [`ImageManager::create`], which runs the
//! validation sequence in a fixed order and stops at the first failure:
//!
//! ```text
//! size ─▶ sniff MIME ─▶ allow-list ─▶ identify ─▶ resolution ─▶ MD5 ─▶ record
//! ```
//!
//! | Entry point | Source | Record data |
//! |---|---|---|
//! | [`from_bytes`](ImageManager::from_bytes) | in-memory buffer | `Inline` |
//! | [`from_file`](ImageManager::from_file) | path on the [`FileSystem`](crate::storage::FileSystem) | `File(path)` |
//! | [`from_data_url`](ImageManager::from_data_url) | `data:` URL | `Inline` |
//! | [`from_url`](ImageManager::from_url) | http(s) via [`HttpFetch`](crate::fetch::HttpFetch) | `Inline` |
//!
//! The MIME type comes from the content (magic bytes via `infer`), never from
//! a file extension or a `Content-Type` header.

use crate::error::{ImageError, Result};
use crate::fetch::{FetchError, request_headers};
use crate::format::ImageFormat;
use crate::manager::ImageManager;
use crate::record::{ImageData, ImageRecord};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use log::{debug, info, warn};
use md5::{Digest, Md5};
use regex::Regex;
use reqwest::Url;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Reported for content `infer` does not recognise.
const UNKNOWN_MIME: &str = "application/octet-stream";

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^data:(?://)?[^,]*?(?P<base64>;base64)?,(?P<data>.+)$")
        .expect("data URL pattern is valid")
});

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Where validated bytes came from, and so what the record will reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Origin {
    /// The record takes ownership of the bytes.
    Inline,
    /// The bytes were read from this path; the record references it and the
    /// buffer is released after validation.
    File(PathBuf),
}

impl ImageManager {
    /// Run the validation sequence over `bytes` and build a record.
    ///
    /// `Origin::File` must name the path `bytes` were read from; only
    /// [`from_file`](Self::from_file) builds one.
    pub(crate) fn create(&self, bytes: Vec<u8>, origin: Origin) -> Result<ImageRecord> {
        let size = bytes.len() as u64;
        self.check_size(size)?;

        let mime = infer::get(&bytes).map_or(UNKNOWN_MIME, |kind| kind.mime_type());
        let Some((mime_type, format)) = ImageFormat::from_mime(mime) else {
            warn!("Rejected content sniffed as {mime}");
            return Err(ImageError::UnsupportedMime(mime.to_string()));
        };
        if !self.config.is_type_supported(format) {
            warn!("Rejected {format} image: type not allowed");
            return Err(ImageError::UnsupportedType(format));
        }
        debug!("Sniffed {mime_type} ({format}), {size} bytes");

        let dims = self
            .backend
            .identify(&bytes)
            .map_err(|e| ImageError::NotAnImage(e.to_string()))?;
        if dims.width > self.config.max_width || dims.height > self.config.max_height {
            warn!("Rejected {}x{} image: too large", dims.width, dims.height);
            return Err(ImageError::ResolutionTooLarge {
                width: dims.width,
                height: dims.height,
                max_width: self.config.max_width,
                max_height: self.config.max_height,
            });
        }

        let md5: [u8; 16] = Md5::digest(&bytes).into();
        let data = match origin {
            Origin::Inline => ImageData::Inline(bytes),
            Origin::File(path) => ImageData::File(path),
        };

        Ok(ImageRecord::new(
            size,
            mime_type,
            format,
            (dims.width, dims.height),
            md5,
            data,
        ))
    }

    pub fn from_bytes(&self, bytes: Vec<u8>) -> Result<ImageRecord> {
        self.create(bytes, Origin::Inline)
    }

    /// Ingest a file. The record references `path`; its bytes are not kept.
    pub fn from_file(&self, path: impl AsRef<Path>) -> Result<ImageRecord> {
        let path = path.as_ref();
        if !self.fs.is_file(path) {
            return Err(ImageError::PathNotFound(path.to_path_buf()));
        }
        if !self.fs.is_readable(path) {
            return Err(ImageError::NotReadable(path.to_path_buf()));
        }

        // Size from metadata first so oversized files are never read.
        self.check_size(self.fs.file_size(path)?)?;
        let bytes = self
            .fs
            .read_all(path)
            .map_err(|_| ImageError::NotReadable(path.to_path_buf()))?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.create(bytes, Origin::File(path.to_path_buf()))
    }

    /// Ingest a `data:` URL. Base64 payloads are decoded (padding optional,
    /// whitespace ignored); anything else is taken as the raw bytes.
    pub fn from_data_url(&self, url: &str) -> Result<ImageRecord> {
        let caps = DATA_URL
            .captures(url)
            .ok_or_else(|| ImageError::InvalidPath("malformed data URL".into()))?;
        let payload = &caps["data"];

        let bytes = if caps.name("base64").is_some() {
            let compact: Vec<u8> = payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            LENIENT_BASE64
                .decode(compact)
                .map_err(|e| ImageError::InvalidPath(format!("bad base64 payload: {e}")))?
        } else {
            payload.as_bytes().to_vec()
        };

        self.from_bytes(bytes)
    }

    /// Ingest a remote image. `data:` URLs are handled inline and
    /// protocol-relative URLs are fetched over https.
    ///
    /// The body is never buffered past `max_size + 1` bytes, whatever the
    /// server declares.
    pub fn from_url(&self, url: &str) -> Result<ImageRecord> {
        let url = url.trim();
        if url.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
            return self.from_data_url(url);
        }

        let absolute = if url.starts_with("//") {
            format!("https:{url}")
        } else {
            url.to_string()
        };
        let parsed = parse_remote_url(&absolute)?;

        info!("Fetching {parsed}");
        let headers = request_headers(&parsed, &self.config.fetch.user_agent);
        let read_failed = |source: FetchError| ImageError::ReadFailed {
            url: absolute.clone(),
            source,
        };
        let response = self.fetcher.fetch(&parsed, &headers).map_err(read_failed)?;

        if let Some(declared) = response.declared_size {
            self.check_size(declared)?;
        }

        let limit = self.config.max_size.saturating_add(1);
        let mut body = Vec::new();
        response
            .body
            .take(limit)
            .read_to_end(&mut body)
            .map_err(|e| read_failed(FetchError::Transport(e.to_string())))?;
        self.check_size(body.len() as u64)?;

        self.create(body, Origin::Inline)
    }

    /// Persist `record` as `directory/name` (default: its
    /// [`full_name`](ImageRecord::full_name)) and return a record referencing
    /// the new file. Existing files are never overwritten.
    pub fn save_to(
        &self,
        record: &ImageRecord,
        directory: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<ImageRecord> {
        let directory = directory.as_ref();
        let target = directory.join(name.map_or_else(|| record.full_name(), str::to_string));
        let write_failed = |reason: String| ImageError::WriteFailed {
            path: target.clone(),
            reason,
        };

        if !self.fs.exists(directory) {
            self.fs
                .create_dir_all(directory)
                .map_err(|e| write_failed(e.to_string()))?;
        }
        if self.fs.exists(&target) {
            return Err(write_failed("file already exists".into()));
        }

        match record.data() {
            ImageData::File(source) => self.fs.copy(source, &target),
            ImageData::Inline(bytes) => self.fs.write_all(&target, bytes),
        }
        .map_err(|e| write_failed(e.to_string()))?;

        info!("Saved {} to {}", record.name(), target.display());
        Ok(record.relocated(target))
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.config.max_size {
            warn!("Rejected {size} byte image: over {}", self.config.max_size);
            return Err(ImageError::TooLarge {
                size,
                max: self.config.max_size,
            });
        }
        Ok(())
    }
}

fn parse_remote_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| ImageError::InvalidPath(format!("{url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ImageError::InvalidPath(format!(
            "{url}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ImageError::InvalidPath(format!("{url}: missing host")));
    }
    Ok(parsed)
}
