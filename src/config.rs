//! Configuration for FlashStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a FlashStore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the store file and any static files served over HTTP
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── presets.json     (the store file)
    ///     └── index.htm, ...   (static files)
    pub data_dir: PathBuf,

    /// Name of the store file, relative to `data_dir`
    pub store_file: String,

    // -------------------------------------------------------------------------
    // Document Configuration
    // -------------------------------------------------------------------------
    /// Largest serialized value (in bytes) the store will read or write
    pub document_capacity: usize,

    /// How freed byte ranges are reused by later writes
    pub slack_policy: SlackPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address for the static-file server
    pub listen_addr: String,

    /// Max requests served at once; further requests wait
    pub max_connections: usize,

    /// Per-request timeout (milliseconds); a slower request gets `408`
    pub request_timeout_ms: u64,

    /// File served for request paths ending in `/`
    pub index_file: String,
}

/// Slack reuse policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlackPolicy {
    /// Use the first filler run large enough for the new entry
    #[default]
    FirstFit,

    /// Use the smallest filler run large enough for the new entry (full scan)
    BestFit,

    /// Never reuse slack; always insert before the closing brace
    AppendOnly,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./flashstore_data"),
            store_file: "presets.json".to_string(),
            document_capacity: 1024,
            slack_policy: SlackPolicy::FirstFit,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 4,
            request_timeout_ms: 5000,
            index_file: "index.htm".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    /// Reject settings the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.document_capacity == 0 {
            return Err(StoreError::Config(
                "document_capacity must be greater than zero".to_string(),
            ));
        }
        if self.store_file.trim().is_empty() {
            return Err(StoreError::Config("store_file must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(StoreError::Config(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(StoreError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for the store file and static files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the store file name
    pub fn store_file(mut self, name: impl Into<String>) -> Self {
        self.config.store_file = name.into();
        self
    }

    /// Set the document capacity (in bytes)
    pub fn document_capacity(mut self, bytes: usize) -> Self {
        self.config.document_capacity = bytes;
        self
    }

    /// Set the slack reuse policy
    pub fn slack_policy(mut self, policy: SlackPolicy) -> Self {
        self.config.slack_policy = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the per-request timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    /// Set the index file served for directory paths
    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.config.index_file = name.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
