//! In-memory file storage
//!
//! Files are shared byte vectors; every handle opened on the same path
//! sees the same bytes, like a real filesystem.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{FileSystem, StoreFile};

type SharedBytes = Rc<RefCell<Vec<u8>>>;

/// In-memory filesystem (cheap to clone; clones share contents)
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: Rc<RefCell<HashMap<PathBuf, SharedBytes>>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a file's bytes
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .borrow()
            .get(path.as_ref())
            .map(|data| data.borrow().clone())
    }

    /// Replace (or create) a file with the given bytes
    pub fn insert(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(
            path.as_ref().to_path_buf(),
            Rc::new(RefCell::new(bytes.into())),
        );
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.borrow_mut().remove(path.as_ref()).is_some()
    }

    fn lookup(&self, path: &Path) -> io::Result<SharedBytes> {
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{:?} does not exist", path))
        })
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn open_read(&self, path: &Path) -> io::Result<MemFile> {
        Ok(MemFile::new(self.lookup(path)?, false))
    }

    fn open_rw(&self, path: &Path) -> io::Result<MemFile> {
        Ok(MemFile::new(self.lookup(path)?, true))
    }

    fn create(&self, path: &Path) -> io::Result<MemFile> {
        let data: SharedBytes = Rc::new(RefCell::new(Vec::new()));
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&data));
        Ok(MemFile::new(data, true))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}

/// Handle to an in-memory file
#[derive(Debug)]
pub struct MemFile {
    data: SharedBytes,
    pos: u64,
    writable: bool,
}

impl MemFile {
    fn new(data: SharedBytes, writable: bool) -> Self {
        Self {
            data,
            pos: 0,
            writable,
        }
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.borrow();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file opened read-only",
            ));
        }
        let mut data = self.data.borrow_mut();
        let start = self.pos as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.borrow().len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => len + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl StoreFile for MemFile {
    fn len(&self) -> io::Result<u64> {
        Ok(self.data.borrow().len() as u64)
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file opened read-only",
            ));
        }
        self.data.borrow_mut().resize(len as usize, 0);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
