//! Bounded JSON documents
//!
//! A [`Document`] holds one JSON value whose serialized form may not exceed
//! a fixed byte capacity. Overflow is always reported, never truncated.

use std::io::{self, Write};

use serde_json::Value;

use crate::error::{Result, StoreError};

/// A JSON value with a serialized-size ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    capacity: usize,
    value: Value,
}

impl Document {
    /// Create an empty (null) document
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            value: Value::Null,
        }
    }

    /// Maximum serialized size in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Replace the held value, rejecting it if it does not fit
    pub fn set(&mut self, value: Value) -> Result<()> {
        check_capacity(&value, self.capacity)?;
        self.value = value;
        Ok(())
    }

    /// Reset to null
    pub fn clear(&mut self) {
        self.value = Value::Null;
    }

    /// Parse one JSON value from the start of `bytes` into this document
    ///
    /// Returns the number of bytes the value occupied. On error the
    /// document is left unchanged.
    pub fn parse_from(&mut self, bytes: &[u8]) -> Result<usize> {
        let (value, used) = parse_prefix(bytes, self.capacity)?;
        self.value = value;
        Ok(used)
    }
}

// =============================================================================
// Measure / Serialize / Parse
// =============================================================================

/// Serialized length of `value` without materializing the bytes
pub fn measure(value: &Value) -> usize {
    let mut counter = ByteCounter(0);
    // Writing into a counter cannot fail, and `Value` always serializes.
    let _ = serde_json::to_writer(&mut counter, value);
    counter.0
}

/// Compact serialization, checked against `capacity`
pub fn serialize(value: &Value, capacity: usize) -> Result<Vec<u8>> {
    check_capacity(value, capacity)?;
    Ok(serde_json::to_vec(value)?)
}

/// Fail with `CapacityOverflow` if `value` serializes to more than `capacity` bytes
pub fn check_capacity(value: &Value, capacity: usize) -> Result<usize> {
    let needed = measure(value);
    if needed > capacity {
        return Err(StoreError::CapacityOverflow { needed, capacity });
    }
    Ok(needed)
}

/// Parse exactly one JSON value from the start of `bytes`
///
/// Returns the value and the offset just past it (leading whitespace
/// included, trailing whitespace not). Bytes after the value are ignored.
///
/// Callers reading from a larger stream pass a window of `capacity + 1`
/// bytes: any value that fits ends strictly inside it, and anything cut
/// off by the window end is reported as `CapacityOverflow`.
pub fn parse_prefix(bytes: &[u8], capacity: usize) -> Result<(Value, usize)> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => {
            let end = stream.byte_offset();
            let size = end - leading_whitespace(bytes);
            if size > capacity {
                return Err(StoreError::CapacityOverflow {
                    needed: size,
                    capacity,
                });
            }
            Ok((value, end))
        }
        Some(Err(e)) if e.is_eof() && bytes.len() > capacity => {
            Err(StoreError::CapacityOverflow {
                needed: bytes.len(),
                capacity,
            })
        }
        Some(Err(e)) => Err(StoreError::MalformedStore(format!(
            "cannot parse value: {}",
            e
        ))),
        None => Err(StoreError::MalformedStore(
            "expected a value, found end of file".to_string(),
        )),
    }
}

fn leading_whitespace(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .count()
}

/// `io::Write` sink that only counts bytes
struct ByteCounter(usize);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
