//! Named hashes over image records.
//!
//! | Name | Kind | Source |
//! |---|---|---|
//! | `dct` | perceptual, 8 bytes | [`perceptual`](crate::perceptual) |
//! | `dhash` | perceptual, 8 bytes | `image_hasher` gradient |
//! | `ahash` | perceptual, 8 bytes | `image_hasher` mean |
//! | `phash_average` | perceptual, 8 bytes | `image_hasher` mean + DCT |
//! | `phash_median` | perceptual, 8 bytes | `image_hasher` median + DCT |
//! | `md5`, `sha1`, `sha224`, `sha256`, `sha384`, `sha512` | content digest | `md-5`, `sha1`, `sha2` |
//!
//! Perceptual hashes decode pixels; content digests only read the raw bytes,
//! streaming them from disk for file-backed records.

use crate::error::{ImageError, Result};
use crate::manager::ImageManager;
use crate::perceptual;
use crate::record::{ImageData, ImageRecord};
use image_hasher::{HashAlg, Hasher, HasherConfig};
use log::debug;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Dct,
    DHash,
    AHash,
    PHashAverage,
    PHashMedian,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 11] = [
        Self::Dct,
        Self::DHash,
        Self::AHash,
        Self::PHashAverage,
        Self::PHashMedian,
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dct => "dct",
            Self::DHash => "dhash",
            Self::AHash => "ahash",
            Self::PHashAverage => "phash_average",
            Self::PHashMedian => "phash_median",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Whether the hash is computed from pixels rather than raw bytes.
    pub fn is_perceptual(self) -> bool {
        matches!(
            self,
            Self::Dct | Self::DHash | Self::AHash | Self::PHashAverage | Self::PHashMedian
        )
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown hash algorithm: {s}"))
    }
}

/// The `image_hasher` hashers, built once per manager.
pub struct HashRegistry {
    dhash: Hasher,
    ahash: Hasher,
    phash_average: Hasher,
    phash_median: Hasher,
}

impl HashRegistry {
    pub fn new() -> Self {
        let build = |alg: HashAlg, dct: bool| {
            let config = HasherConfig::new().hash_size(8, 8).hash_alg(alg);
            if dct {
                config.preproc_dct().to_hasher()
            } else {
                config.to_hasher()
            }
        };
        Self {
            dhash: build(HashAlg::Gradient, false),
            ahash: build(HashAlg::Mean, false),
            phash_average: build(HashAlg::Mean, true),
            phash_median: build(HashAlg::Median, true),
        }
    }

    /// Hasher for a named `image_hasher` algorithm. `None` for algorithms
    /// computed elsewhere.
    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&Hasher> {
        match algorithm {
            HashAlgorithm::DHash => Some(&self.dhash),
            HashAlgorithm::AHash => Some(&self.ahash),
            HashAlgorithm::PHashAverage => Some(&self.phash_average),
            HashAlgorithm::PHashMedian => Some(&self.phash_median),
            _ => None,
        }
    }
}

impl Default for HashRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageManager {
    /// The hand-rolled 64-bit DCT hash.
    pub fn dct_hash(&self, record: &ImageRecord) -> Result<[u8; 8]> {
        let image = self.decode(record)?;
        perceptual::dct_hash(self.backend.as_ref(), &image)
            .map_err(|e| ImageError::ResizeFailed(e.to_string()))
    }

    /// Hash `record` with the algorithm called `name`. Unknown names yield
    /// `Ok(None)`.
    pub fn hash(&self, record: &ImageRecord, name: &str) -> Result<Option<Vec<u8>>> {
        let Ok(algorithm) = name.parse::<HashAlgorithm>() else {
            debug!("No hash algorithm named {name:?}");
            return Ok(None);
        };
        self.hash_with(record, algorithm).map(Some)
    }

    pub fn hash_with(&self, record: &ImageRecord, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
        match algorithm {
            HashAlgorithm::Dct => self.dct_hash(record).map(|h| h.to_vec()),
            HashAlgorithm::Md5 => self.digest::<Md5>(record),
            HashAlgorithm::Sha1 => self.digest::<Sha1>(record),
            HashAlgorithm::Sha224 => self.digest::<Sha224>(record),
            HashAlgorithm::Sha256 => self.digest::<Sha256>(record),
            HashAlgorithm::Sha384 => self.digest::<Sha384>(record),
            HashAlgorithm::Sha512 => self.digest::<Sha512>(record),
            external => {
                let image = self.decode(record)?;
                let hasher = self.hashers.get(external).ok_or_else(|| {
                    ImageError::NotAnImage(format!("no hasher registered for {external}"))
                })?;
                Ok(hasher.hash_image(&image).as_bytes().to_vec())
            }
        }
    }

    fn digest<D: Digest + Write>(&self, record: &ImageRecord) -> Result<Vec<u8>> {
        let mut hasher = D::new();
        match record.data() {
            ImageData::Inline(bytes) => Digest::update(&mut hasher, bytes),
            ImageData::File(path) => {
                io::copy(&mut self.fs.open(path)?, &mut hasher)?;
            }
        }
        Ok(hasher.finalize().to_vec())
    }
}
