//! Slack Scanner
//!
//! One pass over the store file that finds reusable filler runs and the
//! closing brace of the top-level object.
//!
//! Only runs directly inside the top-level object count as slack. Filler
//! inside strings or nested values belongs to those values, and a run next
//! to a `:` sits between a key and its value, so neither is ever reused.

use std::io::{self, BufReader, Read};

use crate::config::SlackPolicy;

use super::scanner::JsonCursor;
use super::FILLER;

/// Where a new entry can be written inside an existing filler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Offset of the first filler byte of the run
    pub offset: u64,
    /// Length of the whole run
    pub run_len: u64,
    /// A `,` must precede the entry (a live entry ends just before the run)
    pub leading_comma: bool,
    /// A `,` must follow the entry (a live entry starts just after the run)
    pub trailing_comma: bool,
}

impl Placement {
    /// Bytes needed to write an entry of `entry_len` here, separators included
    pub fn needed(&self, entry_len: u64) -> u64 {
        entry_len + self.leading_comma as u64 + self.trailing_comma as u64
    }
}

/// Closing brace of the top-level object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingBrace {
    pub offset: u64,
    /// The object already has members, so a new one needs a `,` first
    pub needs_comma: bool,
}

/// Result of a slack scan
///
/// With `SlackPolicy::FirstFit` the scan stops at the first fitting run,
/// so the counters and `closing_brace` only cover the bytes seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlackReport {
    pub placement: Option<Placement>,
    pub closing_brace: Option<ClosingBrace>,
    /// Total filler bytes directly inside the top-level object
    pub slack_bytes: u64,
    /// Longest run of such filler bytes
    pub largest_run: u64,
    /// Number of such runs
    pub run_count: u64,
    /// Bytes scanned
    pub scanned: u64,
}

#[derive(Debug)]
struct OpenRun {
    start: u64,
    len: u64,
    prev: Option<u8>,
    top_level: bool,
}

/// Scan a store file from its first byte
///
/// `entry_len` is the length of the `"key":value` text to place; pass
/// `None` to only collect statistics.
pub fn scan<R: Read>(
    reader: R,
    entry_len: Option<u64>,
    policy: SlackPolicy,
) -> io::Result<SlackReport> {
    let wanted = match policy {
        SlackPolicy::AppendOnly => None,
        _ => entry_len,
    };

    let mut report = SlackReport::default();
    let mut cursor = JsonCursor::new();
    let mut prev: Option<u8> = None;
    let mut run: Option<OpenRun> = None;

    for (offset, byte) in BufReader::new(reader).bytes().enumerate() {
        let byte = byte?;
        let offset = offset as u64;
        report.scanned = offset + 1;

        if cursor.in_string() {
            cursor.advance(byte);
            prev = Some(byte);
            continue;
        }

        if byte == FILLER {
            run.get_or_insert(OpenRun {
                start: offset,
                len: 0,
                prev,
                top_level: cursor.depth() == 1,
            })
            .len += 1;
            prev = Some(byte);
            continue;
        }

        if let Some(ended) = run.take() {
            if ended.top_level && cursor.depth() == 1 {
                report.slack_bytes += ended.len;
                report.largest_run = report.largest_run.max(ended.len);
                report.run_count += 1;

                if let Some(entry_len) = wanted {
                    if let Some(candidate) = fit(&ended, byte, entry_len) {
                        tracing::trace!(?candidate, "slack run fits");
                        match policy {
                            SlackPolicy::FirstFit => {
                                report.placement = Some(candidate);
                                return Ok(report);
                            }
                            _ => {
                                let tighter = report
                                    .placement
                                    .map_or(true, |best| candidate.run_len < best.run_len);
                                if tighter {
                                    report.placement = Some(candidate);
                                }
                            }
                        }
                    }
                }
            }
        }

        let before = cursor.last_significant();
        cursor.advance(byte);
        if byte == b'}' && cursor.depth() == 0 {
            report.closing_brace = Some(ClosingBrace {
                offset,
                needs_comma: !matches!(before, Some(b'{') | Some(b',')),
            });
        }
        prev = Some(byte);
    }

    Ok(report)
}

/// Check whether an ended run can hold an entry, given the byte that ended it
fn fit(run: &OpenRun, next: u8, entry_len: u64) -> Option<Placement> {
    let before = run.prev?;
    let usable = |b: u8| b != b':' && !b.is_ascii_whitespace();
    if !usable(before) || !usable(next) {
        return None;
    }

    let placement = Placement {
        offset: run.start,
        run_len: run.len,
        leading_comma: !matches!(before, b'{' | b','),
        trailing_comma: !matches!(next, b'}' | b','),
    };

    (placement.needed(entry_len) <= run.len).then_some(placement)
}
