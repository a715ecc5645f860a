//! Key Scanner
//!
//! Linear byte-wise search for a literal key token, either anywhere in the
//! file or only where a top-level member key can start.

use std::io::{self, BufRead};

/// Streaming matcher for one literal token
///
/// Keeps a single match index. On a mismatch the index resets to zero and
/// the same byte is tested again against the start of the token, so a byte
/// that breaks one partial match can still begin the next.
#[derive(Debug, Clone)]
pub struct KeyScanner<'a> {
    token: &'a [u8],
    index: usize,
}

impl<'a> KeyScanner<'a> {
    pub fn new(token: &'a [u8]) -> Self {
        Self { token, index: 0 }
    }

    /// Feed one byte; returns true when the token has just been completed
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.token.is_empty() {
            return true;
        }
        if byte != self.token[self.index] {
            self.index = 0;
        }
        if byte == self.token[self.index] {
            self.index += 1;
            if self.index >= self.token.len() {
                self.index = 0;
                return true;
            }
        }
        false
    }

    /// Number of token bytes matched so far
    pub fn matched(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Lexical position inside a JSON text, fed one byte at a time
///
/// Tracks nesting depth, string state and the last significant byte seen
/// outside whitespace. Enough to tell a top-level member key apart from
/// the same bytes inside a nested value or a string.
#[derive(Debug, Clone, Default)]
pub struct JsonCursor {
    depth: u32,
    in_string: bool,
    escaped: bool,
    last_sig: Option<u8>,
}

impl JsonCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open objects and arrays around the current position
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// Last byte that was not whitespace outside a string
    pub fn last_significant(&self) -> Option<u8> {
        self.last_sig
    }

    /// True when the next `"` would open a member key of the top-level object
    pub fn at_member_key(&self) -> bool {
        !self.in_string && self.depth == 1 && matches!(self.last_sig, Some(b'{') | Some(b','))
    }

    pub fn advance(&mut self, byte: u8) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            self.last_sig = Some(byte);
            return;
        }

        match byte {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        if !byte.is_ascii_whitespace() {
            self.last_sig = Some(byte);
        }
    }
}

/// Matcher for a member key of the top-level object
///
/// Unlike `KeyScanner`, a match may only begin where a key can begin:
/// directly inside the outermost object, after `{` or `,`. The same bytes
/// inside a nested value or inside a string never match.
#[derive(Debug, Clone)]
pub struct KeyMatcher<'a> {
    token: &'a [u8],
    index: Option<usize>,
    cursor: JsonCursor,
}

impl<'a> KeyMatcher<'a> {
    pub fn new(token: &'a [u8]) -> Self {
        Self {
            token,
            index: None,
            cursor: JsonCursor::new(),
        }
    }

    /// Feed one byte; returns true when the token has just been completed
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.token.is_empty() {
            return true;
        }

        let opens_key = self.cursor.at_member_key();
        self.cursor.advance(byte);

        let index = match self.index.take() {
            Some(i) => i,
            None if opens_key => 0,
            None => return false,
        };
        if byte != self.token[index] {
            return false;
        }
        if index + 1 == self.token.len() {
            return true;
        }
        self.index = Some(index + 1);
        false
    }
}

/// Scan `reader` forward for `token`
///
/// Returns the number of bytes consumed up to and including the match, or
/// `None` at end of stream. Only bytes up to the match are consumed, so on
/// success the reader's logical position is one byte past the token.
pub fn find_token<R: BufRead>(reader: &mut R, token: &[u8]) -> io::Result<Option<u64>> {
    if token.is_empty() {
        return Ok(Some(0));
    }

    let mut scanner = KeyScanner::new(token);
    scan_until(reader, |b| scanner.feed(b))
}

/// Like `find_token`, but only matches `token` as a top-level member key
pub fn find_key<R: BufRead>(reader: &mut R, token: &[u8]) -> io::Result<Option<u64>> {
    if token.is_empty() {
        return Ok(Some(0));
    }

    let mut matcher = KeyMatcher::new(token);
    scan_until(reader, |b| matcher.feed(b))
}

fn scan_until<R, P>(reader: &mut R, mut done: P) -> io::Result<Option<u64>>
where
    R: BufRead,
    P: FnMut(u8) -> bool,
{
    let mut consumed: u64 = 0;

    loop {
        let (used, found) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            match buf.iter().position(|&b| done(b)) {
                Some(i) => (i + 1, true),
                None => (buf.len(), false),
            }
        };

        reader.consume(used);
        consumed += used as u64;

        if found {
            return Ok(Some(consumed));
        }
    }
}
