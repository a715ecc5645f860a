//! Tests for the Upsert Engine and Reader
//!
//! These tests verify:
//! - Byte-exact file contents for append, in-place, delete and slack reuse
//! - Separator handling so the file stays a valid JSON object
//! - Keys nested inside values never count as entries
//! - Capacity checks before any byte is written
//! - Recovery of a file with no closing brace
//! - Compaction

use std::collections::BTreeMap;
use std::path::Path;

use flashstore::fs::{FileSystem, MemFile, MemFs};
use flashstore::storage::{
    self, append_or_reuse, compact, ensure_object, entries, upsert, WriteOptions, WriteOutcome,
};
use flashstore::{Document, Key, SlackPolicy, StoreError};
use serde_json::{json, Value};

const STORE: &str = "presets.json";

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_mem_store() -> (MemFs, MemFile) {
    let fs = MemFs::new();
    let file = fs.create(Path::new(STORE)).unwrap();
    (fs, file)
}

fn setup_mem_store_with(bytes: &[u8]) -> (MemFs, MemFile) {
    let fs = MemFs::new();
    fs.insert(STORE, bytes);
    let file = fs.open_rw(Path::new(STORE)).unwrap();
    (fs, file)
}

fn opts() -> WriteOptions {
    WriteOptions {
        capacity: 64,
        slack_policy: SlackPolicy::FirstFit,
    }
}

fn id(n: u32) -> Key {
    Key::Id(n)
}

fn contents(fs: &MemFs) -> String {
    String::from_utf8(fs.contents(STORE).unwrap()).unwrap()
}

fn filler(n: usize) -> String {
    " ".repeat(n)
}

fn read_value(file: &mut MemFile, key: &Key) -> Option<Value> {
    let mut doc = Document::with_capacity(64);
    match storage::read(file, key, &mut doc) {
        Ok(()) => Some(doc.into_value()),
        Err(StoreError::KeyNotFound) => None,
        Err(e) => panic!("unexpected read error: {}", e),
    }
}

fn assert_valid_object(fs: &MemFs) -> serde_json::Map<String, Value> {
    let bytes = fs.contents(STORE).unwrap();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("store is not a JSON object ({}): {:?}", e, contents(fs)))
}

// =============================================================================
// Basic Write Walkthrough
// =============================================================================

#[test]
fn test_write_walkthrough() {
    let (fs, mut file) = setup_mem_store();

    // 1. First entry creates the object
    let outcome = upsert(&mut file, &id(3), Some(&json!({"a": 1})), &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::Appended { offset: 1 });
    assert_eq!(contents(&fs), r#"{"3":{"a":1}}"#);

    // 2. Second entry goes before the closing brace with a comma
    let outcome = upsert(&mut file, &id(5), Some(&json!({"b": 2})), &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::Appended { offset: 13 });
    assert_eq!(contents(&fs), r#"{"3":{"a":1},"5":{"b":2}}"#);

    // 3. Same-length value is replaced in place
    let outcome = upsert(&mut file, &id(3), Some(&json!({"a": 9})), &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::ReplacedInPlace { offset: 5 });
    assert_eq!(contents(&fs), r#"{"3":{"a":9},"5":{"b":2}}"#);

    // 4. Delete turns the entry and its comma into filler
    let outcome = upsert(&mut file, &id(3), None, &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::Deleted);
    assert_eq!(
        contents(&fs),
        format!("{{{}\"5\":{{\"b\":2}}}}", filler(12))
    );
    assert_eq!(contents(&fs).len(), 25);
    assert_eq!(read_value(&mut file, &id(3)), None);

    // 5. A new entry of the same size lands in the freed run
    let outcome = upsert(&mut file, &id(7), Some(&json!({"c": 3})), &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::ReusedSlack { offset: 1 });
    assert_eq!(contents(&fs), r#"{"7":{"c":3},"5":{"b":2}}"#);

    // 6. Reading an absent key changes nothing
    let before = fs.contents(STORE).unwrap();
    assert_eq!(read_value(&mut file, &id(9)), None);
    assert_eq!(fs.contents(STORE).unwrap(), before);

    assert_eq!(read_value(&mut file, &id(7)), Some(json!({"c": 3})));
    assert_eq!(read_value(&mut file, &id(5)), Some(json!({"b": 2})));
}

// =============================================================================
// Replace Tests
// =============================================================================

#[test]
fn test_longer_value_relocates_to_end() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1},"5":{"b":2}}"#);

    let outcome = upsert(&mut file, &id(3), Some(&json!({"a": 99})), &opts()).unwrap();

    assert_eq!(
        outcome,
        WriteOutcome::Relocated {
            offset: 25,
            reused_slack: false,
        }
    );
    assert!(outcome.appended());
    assert_eq!(
        contents(&fs),
        format!("{{{}\"5\":{{\"b\":2}},\"3\":{{\"a\":99}}}}", filler(12))
    );
    assert_eq!(read_value(&mut file, &id(3)), Some(json!({"a": 99})));
}

#[test]
fn test_shorter_value_is_padded() {
    let (fs, mut file) = setup_mem_store_with(br#"{"k":"hello"}"#);
    let key = Key::name("k").unwrap();

    let outcome = upsert(&mut file, &key, Some(&json!("hi")), &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::ReplacedInPlace { offset: 5 });
    assert_eq!(contents(&fs), r#"{"k":"hi"   }"#);
    assert_eq!(read_value(&mut file, &key), Some(json!("hi")));
}

#[test]
fn test_regrow_reuses_own_slack() {
    let (fs, mut file) = setup_mem_store_with(br#"{"k":"hi"   }"#);
    let key = Key::name("k").unwrap();

    let outcome = upsert(&mut file, &key, Some(&json!("hey!!")), &opts()).unwrap();

    assert_eq!(
        outcome,
        WriteOutcome::Relocated {
            offset: 1,
            reused_slack: true,
        }
    );
    assert!(!outcome.appended());
    assert_eq!(contents(&fs), r#"{"k":"hey!!"}"#);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_last_entry_blanks_preceding_comma() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1},"5":{"b":2}}"#);

    upsert(&mut file, &id(5), None, &opts()).unwrap();

    assert_eq!(contents(&fs), format!("{{\"3\":{{\"a\":1}}{}}}", filler(12)));
    assert_valid_object(&fs);
}

#[test]
fn test_delete_middle_entry() {
    let (fs, mut file) = setup_mem_store_with(br#"{"a":1,"b":2,"c":3}"#);

    upsert(&mut file, &Key::name("b").unwrap(), None, &opts()).unwrap();

    assert_eq!(contents(&fs), format!("{{\"a\":1,{}\"c\":3}}", filler(6)));
    let object = assert_valid_object(&fs);
    assert_eq!(object.len(), 2);
}

#[test]
fn test_delete_only_entry_then_reuse() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1}}"#);

    upsert(&mut file, &id(3), None, &opts()).unwrap();
    assert_eq!(contents(&fs), format!("{{{}}}", filler(11)));

    let outcome = upsert(&mut file, &id(5), Some(&json!({"b": 2})), &opts()).unwrap();
    assert_eq!(outcome, WriteOutcome::ReusedSlack { offset: 1 });
    assert_eq!(contents(&fs), r#"{"5":{"b":2}}"#);
}

#[test]
fn test_delete_absent_key_is_noop() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1}}"#);

    let outcome = upsert(&mut file, &id(4), None, &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::Unchanged);
    assert_eq!(contents(&fs), r#"{"3":{"a":1}}"#);
}

#[test]
fn test_null_value_deletes() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1}}"#);

    let outcome = upsert(&mut file, &id(3), Some(&Value::Null), &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::Deleted);
    assert!(assert_valid_object(&fs).is_empty());
}

// =============================================================================
// Nested Key Tests
// =============================================================================

#[test]
fn test_nested_key_is_not_an_entry() {
    let (fs, mut file) = setup_mem_store();
    upsert(&mut file, &id(5), Some(&json!({"3": 1})), &opts()).unwrap();

    let outcome = upsert(&mut file, &id(3), Some(&json!(7)), &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::Appended { offset: 13 });
    assert_eq!(contents(&fs), r#"{"5":{"3":1},"3":7}"#);
    assert_eq!(read_value(&mut file, &id(5)), Some(json!({"3": 1})));
    assert_eq!(read_value(&mut file, &id(3)), Some(json!(7)));
}

#[test]
fn test_delete_leaves_nested_key_alone() {
    let (fs, mut file) = setup_mem_store_with(br#"{"5":{"3":1},"3":7}"#);

    assert_eq!(upsert(&mut file, &id(3), None, &opts()).unwrap(), WriteOutcome::Deleted);

    assert_eq!(contents(&fs), format!(r#"{{"5":{{"3":1}}{}}}"#, filler(6)));
    assert_eq!(read_value(&mut file, &id(5)), Some(json!({"3": 1})));
    assert_eq!(read_value(&mut file, &id(3)), None);

    // Only the nested member is left; deleting again changes nothing
    assert_eq!(upsert(&mut file, &id(3), None, &opts()).unwrap(), WriteOutcome::Unchanged);
    assert_valid_object(&fs);
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_overflow_leaves_file_untouched() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1}}"#);
    let small = WriteOptions {
        capacity: 8,
        slack_policy: SlackPolicy::FirstFit,
    };

    let err = upsert(&mut file, &id(3), Some(&json!({"long": "abcdefgh"})), &small).unwrap_err();

    assert!(matches!(
        err,
        StoreError::CapacityOverflow {
            needed: 19,
            capacity: 8
        }
    ));
    assert_eq!(contents(&fs), r#"{"3":{"a":1}}"#);
}

#[test]
fn test_overflow_on_empty_file_writes_nothing() {
    let (fs, mut file) = setup_mem_store();
    let small = WriteOptions {
        capacity: 4,
        slack_policy: SlackPolicy::FirstFit,
    };

    assert!(upsert(&mut file, &id(1), Some(&json!("too long")), &small).is_err());
    assert_eq!(fs.contents(STORE).unwrap(), b"");
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_missing_closing_brace_reinitialises() {
    let (fs, mut file) = setup_mem_store_with(br#"{"a":1,"b":"#);

    let outcome = upsert(&mut file, &id(3), Some(&json!(3)), &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::Appended { offset: 1 });
    assert_eq!(contents(&fs), r#"{"3":3}"#);
}

#[test]
fn test_single_byte_file_becomes_object() {
    let (fs, mut file) = setup_mem_store_with(b"{");

    upsert(&mut file, &id(3), Some(&json!(3)), &opts()).unwrap();

    assert_eq!(contents(&fs), r#"{"3":3}"#);
}

#[test]
fn test_ensure_object() {
    let (fs, mut file) = setup_mem_store();

    assert!(ensure_object(&mut file).unwrap());
    assert_eq!(contents(&fs), "{}");

    assert!(!ensure_object(&mut file).unwrap());
    assert_eq!(contents(&fs), "{}");
}

// =============================================================================
// Policy Tests
// =============================================================================

#[test]
fn test_append_only_ignores_slack() {
    let (fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1},"5":{"b":2}}"#);
    let append_only = WriteOptions {
        capacity: 64,
        slack_policy: SlackPolicy::AppendOnly,
    };

    upsert(&mut file, &id(3), None, &append_only).unwrap();
    let outcome = upsert(&mut file, &id(7), Some(&json!({"c": 3})), &append_only).unwrap();

    assert_eq!(outcome, WriteOutcome::Appended { offset: 25 });
    assert_eq!(contents(&fs).len(), 37);
    assert_valid_object(&fs);
}

#[test]
fn test_append_or_reuse_on_empty_file() {
    let (fs, mut file) = setup_mem_store();

    let outcome = append_or_reuse(&mut file, &id(1), &json!([1, 2]), &opts()).unwrap();

    assert_eq!(outcome, WriteOutcome::Appended { offset: 1 });
    assert_eq!(contents(&fs), r#"{"1":[1,2]}"#);
}

// =============================================================================
// Reader / Compaction Tests
// =============================================================================

#[test]
fn test_entries_in_file_order() {
    let (_fs, mut file) = setup_mem_store_with(br#"{"9":1,   "b":[true],"2":{"x":null}}"#);

    let all = entries(&mut file).unwrap();

    let keys: Vec<&str> = all.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["9", "b", "2"]);
    assert_eq!(all[1].1, json!([true]));
}

#[test]
fn test_entries_of_blank_file() {
    let (_fs, mut file) = setup_mem_store();

    assert!(entries(&mut file).unwrap().is_empty());
}

#[test]
fn test_entries_of_corrupt_file() {
    let (_fs, mut file) = setup_mem_store_with(br#"{"a":1,"#);

    assert!(matches!(
        entries(&mut file).unwrap_err(),
        StoreError::MalformedStore(_)
    ));
}

#[test]
fn test_compact_reclaims_slack() {
    let text = format!("{{{}\"5\":{{\"b\":2}},\"k\":\"hi\"   }}", filler(12));
    let (fs, mut file) = setup_mem_store_with(text.as_bytes());

    let reclaimed = compact(&mut file).unwrap();

    assert_eq!(reclaimed, 15);
    assert_eq!(contents(&fs), r#"{"5":{"b":2},"k":"hi"}"#);
}

#[test]
fn test_read_leaves_document_on_miss() {
    let (_fs, mut file) = setup_mem_store_with(br#"{"3":{"a":1}}"#);
    let mut doc = Document::with_capacity(64);
    doc.set(json!("previous")).unwrap();

    let err = storage::read(&mut file, &id(4), &mut doc).unwrap_err();

    assert!(matches!(err, StoreError::KeyNotFound));
    assert_eq!(doc.value(), &json!("previous"));
}

// =============================================================================
// Sequence Tests
// =============================================================================

#[test]
fn test_store_stays_valid_through_mixed_writes() {
    let (fs, mut file) = setup_mem_store();
    let mut expected: BTreeMap<String, Value> = BTreeMap::new();

    for round in 0..6u32 {
        for n in 0..8u32 {
            let value = match (round * 7 + n) % 4 {
                0 => None,
                1 => Some(json!(n)),
                2 => Some(json!({"n": round, "s": "x".repeat(n as usize)})),
                _ => Some(json!([round, n, "tail"])),
            };

            upsert(&mut file, &id(n), value.as_ref(), &opts()).unwrap();
            match value {
                Some(v) => expected.insert(n.to_string(), v),
                None => expected.remove(&n.to_string()),
            };

            let object = assert_valid_object(&fs);
            let actual: BTreeMap<String, Value> = object.into_iter().collect();
            assert_eq!(actual, expected, "after round {} key {}", round, n);
        }
    }

    for (key, value) in &expected {
        let key: Key = key.parse().unwrap();
        assert_eq!(read_value(&mut file, &key).as_ref(), Some(value));
    }
}
