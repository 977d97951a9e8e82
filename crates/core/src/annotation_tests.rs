// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn annotation_round_trips_through_json() {
    let mut a = Annotation::new(AnnotationType::GroupedLink);
    a.set_label("More");
    a.add_link("news", CannedQuery::with_query("news", "today", ""));
    a.add_link("weather", CannedQuery::new("weather"));

    let json = serde_json::to_string(&a).unwrap();
    let back: Annotation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, a);
    assert_eq!(back.links().len(), 2);
}

#[test]
fn annotation_without_links_is_invalid() {
    let a = Annotation::new(AnnotationType::Link);
    assert!(matches!(a.validate(), Err(Error::InvalidArgument(_))));
}
