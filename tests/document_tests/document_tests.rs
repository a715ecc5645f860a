//! Tests for bounded documents and keys
//!
//! These tests verify:
//! - Serialized-size measurement and capacity checks
//! - Prefix parsing offsets and error classification
//! - Documents are unchanged by failed operations
//! - Key tokens, validation and parsing

use flashstore::document::{check_capacity, measure, parse_prefix, serialize};
use flashstore::{Document, Key, StoreError};
use serde_json::json;

// =============================================================================
// Measure / Serialize Tests
// =============================================================================

#[test]
fn test_measure_matches_serialized_length() {
    let values = [
        json!(null),
        json!(12345),
        json!("hé"),
        json!({"a": 1}),
        json!({"name": "ramp", "steps": [1, 2, 3], "on": true}),
    ];

    for value in &values {
        assert_eq!(measure(value), serde_json::to_vec(value).unwrap().len());
    }
    assert_eq!(measure(&json!({"a": 1})), 7);
    assert_eq!(measure(&json!("hé")), 5);
}

#[test]
fn test_serialize_at_capacity_boundary() {
    let value = json!({"a": 1});

    assert_eq!(serialize(&value, 7).unwrap(), br#"{"a":1}"#.to_vec());

    let err = serialize(&value, 6).unwrap_err();
    assert!(matches!(
        err,
        StoreError::CapacityOverflow {
            needed: 7,
            capacity: 6
        }
    ));
}

#[test]
fn test_check_capacity_returns_size() {
    assert_eq!(check_capacity(&json!([1, 2]), 16).unwrap(), 5);
}

// =============================================================================
// Parse Tests
// =============================================================================

#[test]
fn test_parse_prefix_stops_after_value() {
    let (value, used) = parse_prefix(br#"{"a":1},"b":2}"#, 64).unwrap();

    assert_eq!(value, json!({"a": 1}));
    assert_eq!(used, 7);
}

#[test]
fn test_parse_prefix_counts_leading_whitespace() {
    let (value, used) = parse_prefix(b"  [1,2] }", 5).unwrap();

    assert_eq!(value, json!([1, 2]));
    assert_eq!(used, 7);
}

#[test]
fn test_parse_prefix_over_capacity() {
    let err = parse_prefix(b"  [1,2] }", 4).unwrap_err();

    assert!(matches!(err, StoreError::CapacityOverflow { needed: 5, .. }));
}

#[test]
fn test_parse_prefix_cut_off_by_window() {
    let err = parse_prefix(b"\"abcdefghij", 4).unwrap_err();

    assert!(matches!(err, StoreError::CapacityOverflow { capacity: 4, .. }));
}

#[test]
fn test_parse_prefix_truncated_within_capacity() {
    let err = parse_prefix(br#"{"a":"#, 64).unwrap_err();

    assert!(matches!(err, StoreError::MalformedStore(_)));
}

#[test]
fn test_parse_prefix_rejects_garbage() {
    assert!(matches!(
        parse_prefix(b"}", 64).unwrap_err(),
        StoreError::MalformedStore(_)
    ));
    assert!(matches!(
        parse_prefix(b"", 64).unwrap_err(),
        StoreError::MalformedStore(_)
    ));
}

// =============================================================================
// Document Tests
// =============================================================================

#[test]
fn test_document_starts_null() {
    let doc = Document::with_capacity(32);

    assert!(doc.is_null());
    assert_eq!(doc.capacity(), 32);
}

#[test]
fn test_document_set_rejects_oversized_value() {
    let mut doc = Document::with_capacity(8);
    doc.set(json!("ok")).unwrap();

    let err = doc.set(json!("far too long")).unwrap_err();

    assert!(matches!(err, StoreError::CapacityOverflow { .. }));
    assert_eq!(doc.value(), &json!("ok"));
}

#[test]
fn test_document_parse_from() {
    let mut doc = Document::with_capacity(16);

    let used = doc.parse_from(br#"[true,false]  }"#).unwrap();

    assert_eq!(used, 12);
    assert_eq!(doc.value(), &json!([true, false]));
}

#[test]
fn test_document_unchanged_on_parse_error() {
    let mut doc = Document::with_capacity(16);
    doc.set(json!(1)).unwrap();

    assert!(doc.parse_from(b"{\"a\"").is_err());
    assert_eq!(doc.value(), &json!(1));

    doc.clear();
    assert!(doc.is_null());
}

// =============================================================================
// Key Tests
// =============================================================================

#[test]
fn test_key_tokens() {
    assert_eq!(Key::Id(12).token(), b"\"12\":".to_vec());
    assert_eq!(Key::name("lamp").unwrap().token(), b"\"lamp\":".to_vec());
    assert_eq!(Key::from(7u16), Key::Id(7));
}

#[test]
fn test_key_name_validation() {
    for bad in ["", "a\"b", "back\\slash", "line\nbreak"] {
        let err = Key::name(bad).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)), "{:?}", bad);
    }

    assert!(Key::try_from("ok name").is_ok());
}

#[test]
fn test_key_from_str() {
    assert_eq!("42".parse::<Key>().unwrap(), Key::Id(42));
    assert_eq!("0".parse::<Key>().unwrap(), Key::Id(0));
    assert_eq!("007".parse::<Key>().unwrap(), Key::Name("007".to_string()));
    assert_eq!(
        "4294967296".parse::<Key>().unwrap(),
        Key::Name("4294967296".to_string())
    );
    assert_eq!("-1".parse::<Key>().unwrap(), Key::Name("-1".to_string()));
    assert!("".parse::<Key>().is_err());
}

#[test]
fn test_key_display() {
    assert_eq!(Key::Id(3).to_string(), "3");
    assert_eq!(Key::name("preset").unwrap().to_string(), "preset");
}
