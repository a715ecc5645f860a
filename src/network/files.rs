//! Static file lookup
//!
//! Maps request paths to files in a storage context. Knows nothing about
//! HTTP; the router turns a lookup into a response.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::FileSystem;

use super::content_type;

/// A file found for a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Serves files from a storage context by request path
#[derive(Debug, Clone)]
pub struct StaticFiles<F: FileSystem> {
    fs: F,
    index_file: String,
}

impl<F: FileSystem> StaticFiles<F> {
    pub fn new(fs: F, index_file: impl Into<String>) -> Self {
        Self {
            fs,
            index_file: index_file.into(),
        }
    }

    /// Map a request path to an existing file
    ///
    /// Directory paths (ending in `/`) get the index file appended. Paths
    /// with `..` segments or backslashes are refused.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut relative = path.trim_start_matches('/').to_string();
        if path.ends_with('/') {
            relative.push_str(&self.index_file);
        }

        if relative.is_empty()
            || relative.contains('\\')
            || relative.split('/').any(|segment| segment == "..")
        {
            return None;
        }

        let candidate = PathBuf::from(relative);
        self.fs.exists(&candidate).then_some(candidate)
    }

    /// Resolve and read the file for a request path
    ///
    /// `Ok(None)` means nothing is served at that path. With `download`
    /// set the content type is forced to `application/octet-stream`.
    pub fn lookup(&self, path: &str, download: bool) -> Result<Option<StaticFile>> {
        let Some(file) = self.resolve(path) else {
            return Ok(None);
        };

        let body = self.load(&file)?;
        let content_type = content_type(&file.to_string_lossy(), download);
        Ok(Some(StaticFile {
            path: file,
            content_type,
            body,
        }))
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let mut file = self.fs.open_read(path)?;
        let mut body = Vec::new();
        file.read_to_end(&mut body)?;
        Ok(body)
    }
}
