//! File Storage Module
//!
//! The byte-level file interface the store is written against.
//!
//! ## Responsibilities
//! - Open a store file read-only or read-write (read-write fails on a missing file)
//! - Create (or truncate) a store file
//! - Positioned byte reads and writes, total size, truncation
//!
//! Closing is `Drop`. Two implementations ship with the crate: [`DiskFs`]
//! over `std::fs`, and [`MemFs`], an in-memory filesystem for tests and
//! for hosts without a mounted partition.

mod disk;
mod memory;

use std::io::{self, Read, Seek, Write};
use std::path::Path;

pub use disk::DiskFs;
pub use memory::{MemFile, MemFs};

/// An open store file
pub trait StoreFile: Read + Write + Seek {
    /// Total size in bytes
    fn len(&self) -> io::Result<u64>;

    /// True if the file holds no bytes
    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Cut (or zero-extend) the file to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Flush written bytes to the medium
    fn sync(&mut self) -> io::Result<()>;
}

/// A storage context holding store files
///
/// Paths are interpreted by the implementation (relative to a root
/// directory for [`DiskFs`], as opaque names for [`MemFs`]).
pub trait FileSystem {
    type File: StoreFile;

    /// Open an existing file for reading only
    fn open_read(&self, path: &Path) -> io::Result<Self::File>;

    /// Open an existing file for reading and writing
    ///
    /// Must fail with `ErrorKind::NotFound` if the file does not exist.
    fn open_rw(&self, path: &Path) -> io::Result<Self::File>;

    /// Create a file for reading and writing, truncating any existing one
    fn create(&self, path: &Path) -> io::Result<Self::File>;

    /// Check whether a file exists
    fn exists(&self, path: &Path) -> bool;
}

impl StoreFile for std::fs::File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}
