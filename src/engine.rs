//! Engine Module
//!
//! The public store handle that ties the storage context, configuration
//! and byte-level operations together.
//!
//! ## Responsibilities
//! - Own the storage context (no global file handle)
//! - Open the store file per call, creating it on first write
//! - Route reads to the Reader and writes to the Upsert Engine
//! - Typed helpers, dumps, statistics and compaction

use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::document::{self, Document};
use crate::error::{Result, StoreError};
use crate::fs::{DiskFs, FileSystem, StoreFile};
use crate::key::Key;
use crate::storage::{self, WriteOptions, WriteOutcome};

/// The store handle
///
/// ## Concurrency Model
///
/// None. Every call blocks until its scan and writes finish, and nothing is
/// locked. Callers that reach the store from more than one context must
/// route all calls through a single owner.
pub struct Engine<F: FileSystem> {
    /// Engine configuration
    config: Config,

    /// Storage context holding the store file
    fs: F,

    /// Store file path, as understood by `fs`
    path: PathBuf,
}

/// Space accounting for the store file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Total file length in bytes
    pub file_len: u64,

    /// Filler bytes directly inside the top-level object
    pub slack_bytes: u64,

    /// Longest filler run
    pub largest_slack_run: u64,

    /// Number of filler runs
    pub slack_runs: u64,
}

impl Engine<DiskFs> {
    /// Open a disk-backed store rooted at `config.data_dir`
    pub fn open_disk(config: Config) -> Result<Self> {
        let fs = DiskFs::new(&config.data_dir);
        Self::open(fs, config)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open_disk(config)
    }
}

impl<F: FileSystem> Engine<F> {
    /// Create a store over the given storage context
    ///
    /// Nothing is opened yet; the file is created by the first write.
    pub fn open(fs: F, config: Config) -> Result<Self> {
        config.validate()?;
        let path = PathBuf::from(&config.store_file);
        tracing::debug!(path = ?path, capacity = config.document_capacity, "store opened");
        Ok(Self { config, fs, path })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert, replace or (with `None` / `null`) delete the entry for `key`
    pub fn upsert(&self, key: &Key, value: Option<&Value>) -> Result<WriteOutcome> {
        // Capacity is checked before the file is opened or created
        match value.filter(|v| !v.is_null()) {
            Some(v) => {
                document::check_capacity(v, self.config.document_capacity)?;
            }
            None if !self.fs.exists(&self.path) => return Ok(WriteOutcome::Unchanged),
            None => {}
        }

        let mut file = self.open_for_write()?;
        storage::upsert(&mut file, key, value, &self.write_options())
    }

    /// Store `value` under `key`
    pub fn put(&self, key: &Key, value: &Value) -> Result<WriteOutcome> {
        self.upsert(key, Some(value))
    }

    /// Serialize `value` and store it under `key`
    pub fn put_as<T: Serialize>(&self, key: &Key, value: &T) -> Result<WriteOutcome> {
        let value = serde_json::to_value(value)?;
        self.put(key, &value)
    }

    /// Remove the entry for `key`; returns whether it existed
    ///
    /// A missing store file counts as an absent key and is not created.
    pub fn delete(&self, key: &Key) -> Result<bool> {
        Ok(self.upsert(key, None)? == WriteOutcome::Deleted)
    }

    pub fn put_id(&self, id: u32, value: &Value) -> Result<WriteOutcome> {
        self.put(&Key::Id(id), value)
    }

    pub fn delete_id(&self, id: u32) -> Result<bool> {
        self.delete(&Key::Id(id))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Parse the value stored under `key` into `doc`
    ///
    /// Fails with `KeyNotFound` when the key (or the whole file) is absent,
    /// leaving `doc` untouched.
    pub fn read(&self, key: &Key, doc: &mut Document) -> Result<()> {
        let mut file = self.open_for_read()?.ok_or(StoreError::KeyNotFound)?;
        storage::read(&mut file, key, doc)
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &Key) -> Result<Option<Value>> {
        let mut doc = self.document();
        match self.read(key, &mut doc) {
            Ok(()) => Ok(Some(doc.into_value())),
            Err(StoreError::KeyNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the value stored under `key`, deserialized into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &Key) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Check whether `key` has a live entry
    pub fn contains(&self, key: &Key) -> Result<bool> {
        let Some(mut file) = self.open_for_read()? else {
            return Ok(false);
        };
        Ok(storage::locate(&mut file, &key.token(), self.config.document_capacity)?.is_some())
    }

    pub fn get_id(&self, id: u32) -> Result<Option<Value>> {
        self.get(&Key::Id(id))
    }

    pub fn read_id(&self, id: u32, doc: &mut Document) -> Result<()> {
        self.read(&Key::Id(id), doc)
    }

    /// Every live entry in file order
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        match self.open_for_read()? {
            Some(mut file) => storage::entries(&mut file),
            None => Ok(Vec::new()),
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Space accounting for the store file
    pub fn stats(&self) -> Result<StoreStats> {
        let Some(mut file) = self.open_for_read()? else {
            return Ok(StoreStats::default());
        };
        let file_len = file.len()?;
        file.seek(SeekFrom::Start(0))?;
        let report = storage::scan_slack(&mut file, None, self.config.slack_policy)?;

        Ok(StoreStats {
            file_len,
            slack_bytes: report.slack_bytes,
            largest_slack_run: report.largest_run,
            slack_runs: report.run_count,
        })
    }

    /// Rewrite the store without slack; returns the bytes reclaimed
    pub fn compact(&self) -> Result<u64> {
        if !self.fs.exists(&self.path) {
            return Ok(0);
        }
        let mut file = self.open_for_write()?;
        storage::compact(&mut file)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// An empty document with the configured capacity
    pub fn document(&self) -> Document {
        Document::with_capacity(self.config.document_capacity)
    }

    /// Get the store file path (relative to the storage context)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the storage context
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            capacity: self.config.document_capacity,
            slack_policy: self.config.slack_policy,
        }
    }

    /// Open read-write, falling back to create when the file is missing
    fn open_for_write(&self) -> Result<F::File> {
        match self.fs.open_rw(&self.path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "creating store file");
                self.fs.create(&self.path).map_err(|source| self.open_failure(source))
            }
            Err(source) => Err(self.open_failure(source)),
        }
    }

    /// Open read-only; a missing file is `None`
    fn open_for_read(&self) -> Result<Option<F::File>> {
        match self.fs.open_read(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.open_failure(source)),
        }
    }

    fn open_failure(&self, source: io::Error) -> StoreError {
        StoreError::OpenFailure {
            path: self.path.clone(),
            source,
        }
    }
}
