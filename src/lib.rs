//! # FlashStore
//!
//! A single-file JSON object store for wear-sensitive flash storage:
//! - One file, always a valid JSON object, one member per entry
//! - In-place updates when the new value fits, padded with filler
//! - Deletes turn entries into slack that later writes reuse
//! - Bounded documents: oversized values are refused, never truncated
//! - Optional static-file HTTP server over the same data directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │          (owns storage context + config, no globals)         │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ writes                        │ reads
//!                ▼                               ▼
//!   ┌────────────────────────┐        ┌─────────────────────┐
//!   │     Upsert Engine      │        │       Reader        │
//!   │ in place / slack / end │        │  locate + parse     │
//!   └─────┬────────────┬─────┘        └──────────┬──────────┘
//!         │            │                         │
//!         ▼            ▼                         ▼
//!   ┌───────────┐ ┌───────────────┐    ┌─────────────────────┐
//!   │   Slack   │ │ Entry Locator │───▶│     Key Scanner     │
//!   │  Scanner  │ └───────────────┘    └─────────────────────┘
//!   └───────────┘
//!                │
//!                ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │          FileSystem (DiskFs / MemFs) + Document         │
//!   └─────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod document;
pub mod fs;
pub mod storage;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, SlackPolicy};
pub use document::Document;
pub use engine::{Engine, StoreStats};
pub use key::Key;
pub use storage::WriteOutcome;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlashStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
