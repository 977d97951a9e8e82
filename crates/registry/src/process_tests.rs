// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn spawn_failure_is_resource_error() {
    let process = ScopeProcess::new("x", vec!["/nonexistent/scoperunner".into()]);
    let err = process.ensure_running().await.unwrap_err();
    assert!(matches!(err, Error::ResourceError(_)));
    assert_eq!(process.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn missing_exec_data_is_resource_error() {
    let process = ScopeProcess::new("x", Vec::new());
    let err = process.ensure_running().await.unwrap_err();
    assert!(matches!(err, Error::ResourceError(_)));
}

#[tokio::test]
async fn ready_timeout_kills_child_and_reports_resource_error() {
    // A child that never reports ready.
    let process = ScopeProcess::new("sleepy", vec!["/bin/sleep".into(), "10".into()]);

    let start = Instant::now();
    let err = process.ensure_running().await.unwrap_err();
    assert!(matches!(err, Error::ResourceError(_)));
    assert!(start.elapsed() >= READY_TIMEOUT);
    assert_eq!(process.state(), ProcessState::Stopped);

    // A second attempt spawns afresh rather than reusing the dead child.
    let err = process.ensure_running().await.unwrap_err();
    assert!(matches!(err, Error::ResourceError(_)));
}

#[tokio::test]
async fn ready_signal_transitions_to_running() {
    let process = ScopeProcess::new("quick", vec!["/bin/sleep".into(), "10".into()]);

    // Simulate the registry listener receiving Ready shortly after spawn.
    let p = Arc::clone(&process);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        p.mark_ready();
    });

    process.ensure_running().await.unwrap();
    assert_eq!(process.state(), ProcessState::Running);
    assert!(process.last_ping().is_some());

    // Already running: a second call is a cheap no-op.
    process.ensure_running().await.unwrap();

    process.stop().await;
    assert_eq!(process.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn crashed_child_is_respawned_on_next_ensure() {
    // /bin/true exits immediately; mark ready right after spawn so the
    // first ensure_running succeeds, then the child dies.
    let process = ScopeProcess::new("flaky", vec!["/bin/true".into()]);
    let p = Arc::clone(&process);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(50)).await;
            p.mark_ready();
        }
    });

    process.ensure_running().await.unwrap();
    assert_eq!(process.state(), ProcessState::Running);

    // Let the child exit, then ensure again: the record notices the death
    // and spawns a replacement.
    tokio::time::sleep(Duration::from_millis(300)).await;
    process.ensure_running().await.unwrap();
    assert_eq!(process.state(), ProcessState::Running);
}
