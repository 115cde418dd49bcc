//! The pipeline façade.
//!
//! [`ImageManager`] owns the read-only [`ImageConfig`] and the four
//! collaborators (imaging backend, filesystem, HTTP fetcher, perceptual hash
//! registry). Every pipeline operation is a method on it, spread across the
//! modules that implement the stage:
//!
//! | Operation | Module |
//! |---|---|
//! | `create`, `from_bytes`, `from_file`, `from_data_url`, `from_url`, `save_to` | [`ingest`](crate::ingest) |
//! | `transform`, `convert_to` | [`transform`](crate::transform) |
//! | `hash`, `dct_hash` | [`hashing`](crate::hashing) |
//! | `is_animated` | [`animation`](crate::animation) |
//!
//! The manager holds no mutable state, so it is `Send + Sync` and can be
//! shared across threads behind an `Arc` or a plain reference.

use crate::config::ImageConfig;
use crate::error::{ImageError, Result};
use crate::fetch::{HttpFetch, ReqwestFetcher};
use crate::hashing::HashRegistry;
use crate::imaging::{ImageBackend, RustBackend};
use crate::record::{ImageData, ImageRecord};
use crate::storage::{FileSystem, LocalFileSystem};
use image::DynamicImage;
use std::borrow::Cow;

pub struct ImageManager {
    pub(crate) config: ImageConfig,
    pub(crate) backend: Box<dyn ImageBackend>,
    pub(crate) fs: Box<dyn FileSystem>,
    pub(crate) fetcher: Box<dyn HttpFetch>,
    pub(crate) hashers: HashRegistry,
}

impl ImageManager {
    /// Manager with the production collaborators.
    pub fn new(config: ImageConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ImageConfig) -> ImageManagerBuilder {
        ImageManagerBuilder {
            config,
            backend: None,
            fs: None,
            fetcher: None,
        }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// The record's bytes: borrowed for inline records, read through the
    /// filesystem for file-backed ones.
    pub(crate) fn load_bytes<'r>(&self, record: &'r ImageRecord) -> Result<Cow<'r, [u8]>> {
        match record.data() {
            ImageData::Inline(bytes) => Ok(Cow::Borrowed(bytes)),
            ImageData::File(path) => Ok(Cow::Owned(self.fs.read_all(path)?)),
        }
    }

    /// Decode the record's pixels. The raw bytes are released on return.
    pub(crate) fn decode(&self, record: &ImageRecord) -> Result<DynamicImage> {
        let bytes = self.load_bytes(record)?;
        self.backend
            .decode(&bytes)
            .map_err(|e| ImageError::NotAnImage(e.to_string()))
    }
}

/// Builder for [`ImageManager`]. Collaborators left unset get their
/// production implementation.
pub struct ImageManagerBuilder {
    config: ImageConfig,
    backend: Option<Box<dyn ImageBackend>>,
    fs: Option<Box<dyn FileSystem>>,
    fetcher: Option<Box<dyn HttpFetch>>,
}

impl ImageManagerBuilder {
    pub fn backend(mut self, backend: impl ImageBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Some(Box::new(fs));
        self
    }

    pub fn fetcher(mut self, fetcher: impl HttpFetch + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Validate the configuration and assemble the manager.
    pub fn build(self) -> Result<ImageManager> {
        self.config.validate()?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(ReqwestFetcher::new(&self.config.fetch).map_err(|source| {
                ImageError::ReadFailed {
                    url: String::new(),
                    source,
                }
            })?),
        };

        Ok(ImageManager {
            backend: self.backend.unwrap_or_else(|| Box::new(RustBackend::new())),
            fs: self.fs.unwrap_or_else(|| Box::new(LocalFileSystem)),
            fetcher,
            hashers: HashRegistry::new(),
            config: self.config,
        })
    }
}
