//! Entry Locator
//!
//! Finds a key's token and the byte range of the value that follows it.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use serde_json::Value;

use crate::document;
use crate::error::{Result, StoreError};

use super::scanner::find_key;

/// Byte range of one entry in the store file
///
/// ```text
///   "12":{"on":true}
///   ^    ^          ^
///   |    |          value_end (exclusive)
///   |    value_start
///   key_start
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpan {
    pub key_start: u64,
    pub value_start: u64,
    pub value_end: u64,
}

impl EntrySpan {
    /// Bytes occupied by the value
    pub fn value_len(&self) -> u64 {
        self.value_end - self.value_start
    }

    /// Bytes occupied by key token and value together
    pub fn entry_len(&self) -> u64 {
        self.value_end - self.key_start
    }
}

/// Locate `token` as a top-level key and parse the value after it
///
/// Returns `None` when the key is not a member of the outermost object.
/// Whitespace between the token and the value is skipped; after that at
/// most `capacity + 1` bytes of value are read, and a longer value is a
/// `CapacityOverflow`.
pub fn locate<F: Read + Seek>(
    file: &mut F,
    token: &[u8],
    capacity: usize,
) -> Result<Option<(EntrySpan, Value)>> {
    file.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(&mut *file);

    let Some(token_end) = find_key(&mut reader, token)? else {
        return Ok(None);
    };
    let value_start = token_end + skip_whitespace(&mut reader)?;

    let mut window = Vec::with_capacity(capacity.saturating_add(1).min(4096));
    Read::take(&mut reader, (capacity as u64).saturating_add(1)).read_to_end(&mut window)?;

    let (value, used) = document::parse_prefix(&window, capacity)?;
    if used >= window.len() {
        // Nothing after the value: the object is never closed.
        return Err(StoreError::MalformedStore(format!(
            "value at offset {} runs to end of file",
            value_start
        )));
    }

    let span = EntrySpan {
        key_start: token_end - token.len() as u64,
        value_start,
        value_end: value_start + used as u64,
    };
    tracing::trace!(?span, "located entry");

    Ok(Some((span, value)))
}

/// Consume JSON whitespace, returning how many bytes were skipped
fn skip_whitespace<R: BufRead>(reader: &mut R) -> io::Result<u64> {
    let mut skipped: u64 = 0;
    loop {
        let (used, more) = {
            let buf = reader.fill_buf()?;
            let used = buf.iter().take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')).count();
            (used, used == buf.len() && !buf.is_empty())
        };
        reader.consume(used);
        skipped += used as u64;
        if !more {
            return Ok(skipped);
        }
    }
}
