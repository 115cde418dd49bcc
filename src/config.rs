//! Pipeline configuration.
//!
//! The configuration is a plain value handed to
//! [`ImageManager`](crate::ImageManager) at construction and never mutated
//! afterwards. It can be built in code (`ImageConfig::default()` plus struct
//! update syntax) or loaded from a TOML file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! max_size = 10000000                         # Max raw byte length
//! max_width = 10000                           # Max decoded width (px)
//! max_height = 10000                          # Max decoded height (px)
//! supported_types = ["jpeg", "png", "gif", "webp"]
//!
//! [fetch]
//! timeout_secs = 30                           # Whole-request timeout
//! connect_timeout_secs = 10                   # TCP/TLS connect timeout
//! user_agent = "image-intake/0.3.0"
//!
//! [transform]
//! background = [255, 255, 255]                # Canvas fill for opaque formats
//! progressive_jpeg = true
//! ```
//!
//! `supported_types` is an allow-list independent from the MIME table: a MIME
//! type can be known (e.g. `image/bmp`) and still be rejected here.
//!
//! Unknown keys are rejected to catch typos early.

use crate::format::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Limits and collaborator settings for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Maximum raw byte length of an ingested image.
    pub max_size: u64,
    /// Maximum decoded width, also the upper bound for edit widths.
    pub max_width: u32,
    /// Maximum decoded height, also the upper bound for edit heights.
    pub max_height: u32,
    /// Formats accepted on ingestion and as conversion targets.
    pub supported_types: Vec<ImageFormat>,
    /// Remote fetch settings.
    pub fetch: FetchConfig,
    /// Conversion settings.
    pub transform: TransformConfig,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000_000,
            max_width: 10_000,
            max_height: 10_000,
            supported_types: vec![
                ImageFormat::Jpeg,
                ImageFormat::Png,
                ImageFormat::Gif,
                ImageFormat::Webp,
            ],
            fetch: FetchConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

impl ImageConfig {
    pub fn is_type_supported(&self, format: ImageFormat) -> bool {
        self.supported_types.contains(&format)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::Validation("max_size must be 1 or more".into()));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Validation(
                "max_width and max_height must be 1 or more".into(),
            ));
        }
        if self.supported_types.is_empty() {
            return Err(ConfigError::Validation(
                "supported_types must not be empty".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 || self.fetch.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch timeouts must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Remote fetch settings used by [`ReqwestFetcher`](crate::fetch::ReqwestFetcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("image-intake/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// RGB fill for formats without alpha.
    pub background: [u8; 3],
    /// Emit progressive JPEG.
    pub progressive_jpeg: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            progressive_jpeg: true,
        }
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ImageConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ImageConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# image-intake configuration
# All options are optional - defaults shown below.

# Maximum raw byte length of an ingested image.
max_size = 10000000

# Maximum decoded resolution. Also bounds explicit edit dimensions.
max_width = 10000
max_height = 10000

# Formats accepted on ingestion and as conversion targets.
# Known: jpeg, png, gif, webp, bmp, tiff, ico, heif
supported_types = ["jpeg", "png", "gif", "webp"]

[fetch]
# Whole-request timeout for remote images.
timeout_secs = 30
# TCP/TLS connect timeout.
connect_timeout_secs = 10

[transform]
# Canvas fill for formats without an alpha channel.
background = [255, 255, 255]
# Emit progressive (interlaced) JPEG.
progressive_jpeg = true
"#
}
