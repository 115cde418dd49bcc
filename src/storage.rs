//! Filesystem access.
//!
//! File-backed ingestion, byte loading for file-backed records, chunked
//! animation scans and [`save_to`](crate::ImageManager::save_to) all go through
//! the [`FileSystem`] trait. [`LocalFileSystem`] is a thin `std::fs` wrapper;
//! tests and embedders can substitute their own storage.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

pub trait FileSystem: Send + Sync {
    /// Anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// A regular file exists at `path`.
    fn is_file(&self, path: &Path) -> bool;

    /// The file can be opened for reading.
    fn is_readable(&self, path: &Path) -> bool;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.open(path)?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// `std::fs` backed storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_readable(&self, path: &Path) -> bool {
        File::open(path).is_ok()
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(io::BufReader::new(File::open(path)?)))
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }
}
