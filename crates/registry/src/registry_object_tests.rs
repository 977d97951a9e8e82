// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process::ProcessState;
use yare::parameterized;

fn metadata(scope_id: &str) -> ScopeMetadata {
    ScopeMetadata {
        scope_id: scope_id.into(),
        display_name: format!("{} scope", scope_id),
        description: "d".into(),
        icon: None,
        art: None,
        search_hint: None,
        hot_key: None,
        overrideable: false,
        endpoint: format!("unix:///tmp/{}.sock", scope_id),
    }
}

#[tokio::test]
async fn add_then_get_metadata() {
    let registry = RegistryObject::new(None);
    assert!(registry.add_local_scope(metadata("a"), vec!["/bin/true".into()]).unwrap());

    let got = registry.get_metadata("a").await.unwrap();
    assert_eq!(got.scope_id, "a");
    assert!(registry.process("a").is_some());
}

#[tokio::test]
async fn get_metadata_unknown_scope_is_not_found() {
    let registry = RegistryObject::new(None);
    let err = registry.get_metadata("ghost").await.unwrap_err();
    assert_eq!(err, Error::NotFound("no such scope: ghost".into()));
}

#[tokio::test]
async fn empty_id_is_invalid_argument() {
    let registry = RegistryObject::new(None);
    assert!(matches!(registry.get_metadata("").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(registry.locate("").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(registry.remove_local_scope(""), Err(Error::InvalidArgument(_))));
}

#[parameterized(
    empty = { "" },
    slash = { "a/b" },
)]
fn add_rejects_bad_ids(scope_id: &str) {
    let registry = RegistryObject::new(None);
    assert!(matches!(
        registry.add_local_scope(metadata(scope_id), Vec::new()),
        Err(Error::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn registering_same_id_twice_keeps_the_later_entry() {
    let registry = RegistryObject::new(None);
    let mut first = metadata("a");
    first.display_name = "first".into();
    let mut second = metadata("a");
    second.display_name = "second".into();

    assert!(registry.add_local_scope(first, Vec::new()).unwrap());
    assert!(!registry.add_local_scope(second, Vec::new()).unwrap());

    assert_eq!(registry.get_metadata("a").await.unwrap().display_name, "second");
    assert_eq!(registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_then_get_is_not_found() {
    let registry = RegistryObject::new(None);
    registry.add_local_scope(metadata("a"), Vec::new()).unwrap();

    assert!(registry.remove_local_scope("a").unwrap());
    assert!(!registry.remove_local_scope("a").unwrap());
    assert!(matches!(registry.get_metadata("a").await, Err(Error::NotFound(_))));
    assert!(registry.process("a").is_none());
}

#[tokio::test]
async fn locate_unknown_scope_is_not_found() {
    let registry = RegistryObject::new(None);
    assert!(matches!(registry.locate("ghost").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn locate_spawn_failure_is_resource_error_and_retries_fresh() {
    let registry = RegistryObject::new(None);
    registry
        .add_local_scope(metadata("bad"), vec!["/nonexistent/runner".into()])
        .unwrap();

    for _ in 0..2 {
        let err = registry.locate("bad").await.unwrap_err();
        assert!(matches!(err, Error::ResourceError(_)));
        assert_eq!(registry.process("bad").unwrap().state(), ProcessState::Stopped);
    }
}

#[tokio::test]
async fn locate_waits_for_ready_signal() {
    let registry = std::sync::Arc::new(RegistryObject::new(None));
    registry
        .add_local_scope(metadata("slow"), vec!["/bin/sleep".into(), "10".into()])
        .unwrap();

    let r = std::sync::Arc::clone(&registry);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        r.mark_ready("slow");
    });

    let located = registry.locate("slow").await.unwrap();
    assert_eq!(located.scope_id, "slow");
    assert_eq!(registry.process("slow").unwrap().state(), ProcessState::Running);

    registry.shutdown().await;
    assert_eq!(registry.process("slow").unwrap().state(), ProcessState::Stopped);
}

#[tokio::test]
async fn locate_after_shutdown_is_logic_error() {
    let registry = RegistryObject::new(None);
    registry.add_local_scope(metadata("a"), vec!["/bin/true".into()]).unwrap();
    registry.shutdown().await;
    registry.shutdown().await; // idempotent

    assert!(matches!(registry.locate("a").await, Err(Error::LogicError(_))));
}

#[tokio::test]
async fn ready_for_unknown_scope_is_ignored() {
    let registry = RegistryObject::new(None);
    registry.mark_ready("nobody");
}
