//! Upsert Engine
//!
//! Decides how a write lands in the store file and performs it:
//! in place, delete to slack, reuse of slack, or insertion before the
//! closing brace. The file is a valid JSON object after every call.

use std::io::{BufReader, Read, Seek, SeekFrom, Write};

use serde_json::Value;

use crate::config::SlackPolicy;
use crate::document;
use crate::error::Result;
use crate::fs::StoreFile;
use crate::key::Key;

use super::locator::{locate, EntrySpan};
use super::reader::entries;
use super::slack;
use super::FILLER;

/// What a write did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New entry inserted before the closing brace; `offset` is its key token
    Appended { offset: u64 },

    /// New entry written into an existing filler run
    ReusedSlack { offset: u64 },

    /// Existing value overwritten at `offset` and padded with filler
    ReplacedInPlace { offset: u64 },

    /// Value grew: old entry turned to filler, new one written elsewhere
    Relocated { offset: u64, reused_slack: bool },

    /// Entry turned to filler
    Deleted,

    /// Nothing to do (deleting an absent key)
    Unchanged,
}

impl WriteOutcome {
    /// True if the file length may have grown
    pub fn appended(&self) -> bool {
        matches!(
            self,
            WriteOutcome::Appended { .. }
                | WriteOutcome::Relocated {
                    reused_slack: false,
                    ..
                }
        )
    }
}

/// Settings a write needs from the store configuration
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub capacity: usize,
    pub slack_policy: SlackPolicy,
}

/// Insert, replace or delete the entry for `key` in an open store file
///
/// `None` and JSON `null` both delete. The new value is checked against
/// the capacity before any byte is written.
pub fn upsert<F: StoreFile>(
    file: &mut F,
    key: &Key,
    value: Option<&Value>,
    opts: &WriteOptions,
) -> Result<WriteOutcome> {
    let encoded = match value.filter(|v| !v.is_null()) {
        Some(v) => Some(document::serialize(v, opts.capacity)?),
        None => None,
    };

    ensure_object(file)?;

    let token = key.token();
    let located = locate(file, &token, opts.capacity)?.map(|(span, _)| span);

    let outcome = match (located, encoded) {
        (None, None) => WriteOutcome::Unchanged,

        (None, Some(bytes)) => append_encoded(file, &token, &bytes, opts.slack_policy)?,

        (Some(span), None) => {
            erase_entry(file, &span)?;
            WriteOutcome::Deleted
        }

        (Some(span), Some(bytes)) if bytes.len() as u64 <= span.value_len() => {
            file.seek(SeekFrom::Start(span.value_start))?;
            file.write_all(&bytes)?;
            let pad = span.value_len() - bytes.len() as u64;
            file.write_all(&vec![FILLER; pad as usize])?;
            WriteOutcome::ReplacedInPlace {
                offset: span.value_start,
            }
        }

        (Some(span), Some(bytes)) => {
            erase_entry(file, &span)?;
            match append_encoded(file, &token, &bytes, opts.slack_policy)? {
                WriteOutcome::ReusedSlack { offset } => WriteOutcome::Relocated {
                    offset,
                    reused_slack: true,
                },
                WriteOutcome::Appended { offset } => WriteOutcome::Relocated {
                    offset,
                    reused_slack: false,
                },
                other => other,
            }
        }
    };

    file.flush()?;
    tracing::debug!(key = %key, ?outcome, "upsert");
    Ok(outcome)
}

/// Write a new entry for `key`, reusing slack if a run is large enough
///
/// The caller must know the key is absent; nothing checks for duplicates.
pub fn append_or_reuse<F: StoreFile>(
    file: &mut F,
    key: &Key,
    value: &Value,
    opts: &WriteOptions,
) -> Result<WriteOutcome> {
    let bytes = document::serialize(value, opts.capacity)?;
    ensure_object(file)?;
    let outcome = append_encoded(file, &key.token(), &bytes, opts.slack_policy)?;
    file.flush()?;
    Ok(outcome)
}

/// Rewrite the file with every live entry and no slack
///
/// Returns the number of bytes reclaimed.
pub fn compact<F: StoreFile>(file: &mut F) -> Result<u64> {
    let before = file.len()?;
    let live = entries(file)?;

    let mut out = Vec::with_capacity(before as usize);
    out.push(b'{');
    for (i, (key, value)) in live.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut out, key)?;
        out.push(b':');
        serde_json::to_writer(&mut out, value)?;
    }
    out.push(b'}');

    file.truncate(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&out)?;
    file.flush()?;

    let reclaimed = before.saturating_sub(out.len() as u64);
    tracing::debug!(entries = live.len(), reclaimed, "compacted store");
    Ok(reclaimed)
}

/// Initialise a file too short to hold an object with `{}`
///
/// Returns true if the file was (re)initialised.
pub fn ensure_object<F: StoreFile>(file: &mut F) -> Result<bool> {
    if file.len()? >= 2 {
        return Ok(false);
    }
    file.truncate(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(b"{}")?;
    tracing::debug!("initialised empty store object");
    Ok(true)
}

fn append_encoded<F: StoreFile>(
    file: &mut F,
    token: &[u8],
    value: &[u8],
    policy: SlackPolicy,
) -> Result<WriteOutcome> {
    let entry_len = (token.len() + value.len()) as u64;

    file.seek(SeekFrom::Start(0))?;
    let report = slack::scan(&mut *file, Some(entry_len), policy)?;

    if let Some(placement) = report.placement {
        let mut out = Vec::with_capacity(placement.needed(entry_len) as usize);
        if placement.leading_comma {
            out.push(b',');
        }
        out.extend_from_slice(token);
        out.extend_from_slice(value);
        if placement.trailing_comma {
            out.push(b',');
        }

        file.seek(SeekFrom::Start(placement.offset))?;
        file.write_all(&out)?;
        let offset = placement.offset + placement.leading_comma as u64;
        tracing::debug!(offset, run_len = placement.run_len, "reused slack");
        return Ok(WriteOutcome::ReusedSlack { offset });
    }

    let mut out = Vec::with_capacity(entry_len as usize + 2);

    let offset = match report.closing_brace {
        Some(brace) => {
            if brace.needs_comma {
                out.push(b',');
            }
            file.seek(SeekFrom::Start(brace.offset))?;
            brace.offset + brace.needs_comma as u64
        }
        None => {
            tracing::warn!(
                len = report.scanned,
                "store file has no closing brace, reinitialising"
            );
            file.truncate(0)?;
            file.seek(SeekFrom::Start(0))?;
            out.push(b'{');
            1
        }
    };

    out.extend_from_slice(token);
    out.extend_from_slice(value);
    out.push(b'}');
    file.write_all(&out)?;

    Ok(WriteOutcome::Appended { offset })
}

/// Turn an entry's key and value into filler, plus one separating comma
///
/// The comma after the entry goes if there is one, otherwise the comma
/// before it, so no dangling separator is left behind.
fn erase_entry<F: StoreFile>(file: &mut F, span: &EntrySpan) -> Result<()> {
    file.seek(SeekFrom::Start(span.key_start))?;
    file.write_all(&vec![FILLER; span.entry_len() as usize])?;

    let separator = match next_significant(file, span.value_end)? {
        Some((offset, b',')) => Some(offset),
        _ => match prev_significant(file, span.key_start)? {
            Some((offset, b',')) => Some(offset),
            _ => None,
        },
    };

    if let Some(offset) = separator {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&[FILLER])?;
    }

    tracing::debug!(?span, ?separator, "erased entry");
    Ok(())
}

/// First non-whitespace byte at or after `from`
fn next_significant<F: Read + Seek>(file: &mut F, from: u64) -> Result<Option<(u64, u8)>> {
    file.seek(SeekFrom::Start(from))?;
    for (i, byte) in BufReader::new(&mut *file).bytes().enumerate() {
        let byte = byte?;
        if !byte.is_ascii_whitespace() {
            return Ok(Some((from + i as u64, byte)));
        }
    }
    Ok(None)
}

/// Last non-whitespace byte strictly before `before`
fn prev_significant<F: Read + Seek>(file: &mut F, before: u64) -> Result<Option<(u64, u8)>> {
    const CHUNK: u64 = 64;
    let mut end = before;
    let mut buf = [0u8; CHUNK as usize];

    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(i) = chunk.iter().rposition(|b| !b.is_ascii_whitespace()) {
            return Ok(Some((start + i as u64, chunk[i])));
        }
        end = start;
    }
    Ok(None)
}
