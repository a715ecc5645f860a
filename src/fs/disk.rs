//! Disk-backed file storage
//!
//! Thin adapter over `std::fs`, rooted at a directory.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::FileSystem;

/// File storage rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    /// Create a filesystem rooted at `root`
    ///
    /// The directory is created lazily, on the first `create`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for DiskFs {
    type File = File;

    fn open_read(&self, path: &Path) -> io::Result<File> {
        File::open(self.resolve(path))
    }

    fn open_rw(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.resolve(path))
    }

    fn create(&self, path: &Path) -> io::Result<File> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(full)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}
