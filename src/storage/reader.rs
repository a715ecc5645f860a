//! Reader
//!
//! Read-only access to entries: one keyed lookup, or a full walk of the
//! object for dumps and compaction.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::key::Key;

use super::locator::locate;

/// Parse the value stored under `key` into `doc`
///
/// Fails with `KeyNotFound` if the key is absent; `doc` is only touched
/// on success.
pub fn read<F: Read + Seek>(file: &mut F, key: &Key, doc: &mut Document) -> Result<()> {
    match locate(file, &key.token(), doc.capacity())? {
        Some((_, value)) => {
            doc.set(value)?;
            Ok(())
        }
        None => Err(StoreError::KeyNotFound),
    }
}

/// Every live entry, in file order
///
/// Loads the whole file; meant for dumps, compaction and tests.
pub fn entries<F: Read + Seek>(file: &mut F) -> Result<Vec<(String, Value)>> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let ordered: OrderedEntries = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::MalformedStore(format!("store is not a JSON object: {}", e)))?;
    Ok(ordered.0)
}

/// Members of a JSON object in document order
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
