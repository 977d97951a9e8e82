// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serialize_deserialize_round_trip() {
    let cat = Category::new("news", "News", "news.png", CategoryRenderer::new("{}"));
    let back = Category::deserialize(&cat.serialize()).unwrap();
    assert_eq!(back, cat);
}

#[test]
fn deserialize_requires_id() {
    let mut map = VariantMap::new();
    map.insert("title".into(), Variant::from("t"));
    assert!(matches!(Category::deserialize(&map), Err(Error::InvalidArgument(_))));
}

#[test]
fn deserialize_rejects_empty_id() {
    let mut map = VariantMap::new();
    map.insert("id".into(), Variant::from(""));
    assert!(matches!(Category::deserialize(&map), Err(Error::InvalidArgument(_))));
}

#[test]
fn missing_renderer_falls_back_to_default() {
    let mut map = VariantMap::new();
    map.insert("id".into(), Variant::from("c"));
    let cat = Category::deserialize(&map).unwrap();
    assert_eq!(cat.renderer_template().template(), DEFAULT_RENDERER);
}
