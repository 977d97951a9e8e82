// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn int_and_double_stay_distinct_through_json() {
    let int = Variant::Int(3);
    let double = Variant::Double(3.0);

    let int_json = serde_json::to_string(&int).unwrap();
    let double_json = serde_json::to_string(&double).unwrap();
    assert_eq!(int_json, "3");
    assert_eq!(double_json, "3.0");

    let int_back: Variant = serde_json::from_str(&int_json).unwrap();
    let double_back: Variant = serde_json::from_str(&double_json).unwrap();
    assert_eq!(int_back, Variant::Int(3));
    assert_eq!(double_back, Variant::Double(3.0));
}

#[test]
fn nested_structure_round_trips() {
    let mut map = VariantMap::new();
    map.insert("title".into(), Variant::from("weather"));
    map.insert("rank".into(), Variant::Int(1));
    map.insert(
        "tags".into(),
        Variant::Array(vec![Variant::from("a"), Variant::from("b")]),
    );
    let v = Variant::Map(map);

    let json = serde_json::to_string(&v).unwrap();
    let back: Variant = serde_json::from_str(&json).unwrap();
    assert_eq!(back, v);
}

#[test]
fn null_round_trips() {
    let json = serde_json::to_string(&Variant::Null).unwrap();
    assert_eq!(json, "null");
    let back: Variant = serde_json::from_str("null").unwrap();
    assert!(back.is_null());
}

#[test]
fn accessor_type_mismatch_is_logic_error() {
    let v = Variant::Str("x".into());
    let err = v.as_int().unwrap_err();
    assert!(matches!(err, crate::error::Error::LogicError(_)));
    assert!(err.message().contains("string"));
}

#[test]
fn as_double_widens_int() {
    assert_eq!(Variant::Int(2).as_double().unwrap(), 2.0);
}

#[test]
fn map_has_no_duplicate_keys() {
    let mut map = VariantMap::new();
    map.insert("k".into(), Variant::Int(1));
    map.insert("k".into(), Variant::Int(2));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("k"), Some(&Variant::Int(2)));
}
