//! Storage Module
//!
//! Byte-level operations on the single store file.
//!
//! ## Responsibilities
//! - Locate an entry by scanning for its key token
//! - Overwrite values in place when they fit, padding with filler
//! - Turn deleted entries into filler ("slack") and reuse it later
//! - Insert new entries before the closing brace
//!
//! ## File Format
//! ```text
//! ┌───┬───────────────┬───┬──────────────┬───────────┬──────────────┬───┐
//! │ { │ "3":{"a":1}   │ , │ "5":{"b":2}  │ ␠␠␠␠␠␠␠␠  │ "9":[1,2,3]  │ } │
//! └───┴───────────────┴───┴──────────────┴───────────┴──────────────┴───┘
//!       key    value                        slack
//! ```
//! The file is always one JSON object. Slack is a run of filler bytes
//! (`0x20`), which JSON parsers read as whitespace.

mod locator;
mod reader;
mod scanner;
mod slack;
mod writer;

pub use locator::{locate, EntrySpan};
pub use reader::{entries, read};
pub use scanner::{find_key, find_token, JsonCursor, KeyMatcher, KeyScanner};
pub use slack::{scan as scan_slack, ClosingBrace, Placement, SlackReport};
pub use writer::{append_or_reuse, compact, ensure_object, upsert, WriteOptions, WriteOutcome};

/// Byte marking non-live content
pub const FILLER: u8 = b' ';
