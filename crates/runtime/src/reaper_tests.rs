// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

fn counter_cb(counter: &Arc<AtomicUsize>) -> ReaperCallback {
    let counter = Arc::clone(counter);
    Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Poll until `counter` reaches `want` or the deadline passes.
fn wait_for(counter: &AtomicUsize, want: usize, deadline: Duration) -> usize {
    let start = Instant::now();
    loop {
        let got = counter.load(Ordering::SeqCst);
        if got >= want || start.elapsed() > deadline {
            return got;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn create_rejects_zero_intervals() {
    assert!(matches!(
        Reaper::create(Duration::ZERO, TICK, DestroyPolicy::NoCallbackOnDestroy),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        Reaper::create(TICK, Duration::ZERO, DestroyPolicy::NoCallbackOnDestroy),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn create_rejects_reap_interval_longer_than_expiry() {
    assert!(matches!(
        Reaper::create(TICK * 2, TICK, DestroyPolicy::NoCallbackOnDestroy),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn expired_item_fires_exactly_once() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let item = reaper.add(counter_cb(&fired)).unwrap();

    assert_eq!(reaper.size(), 1);
    assert_eq!(wait_for(&fired, 1, TICK * 20), 1);
    assert_eq!(reaper.size(), 0);

    // The item is gone; a late destroy is a harmless no-op.
    item.destroy();
    std::thread::sleep(TICK * 3);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn refresh_keeps_item_alive() {
    let reaper = Reaper::create(TICK, TICK * 2, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let item = reaper.add(counter_cb(&fired)).unwrap();

    // Refresh well past the expiry interval; the callback must not fire.
    for _ in 0..8 {
        std::thread::sleep(TICK / 2);
        item.refresh();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(reaper.size(), 1);

    // Stop refreshing; now it expires.
    assert_eq!(wait_for(&fired, 1, TICK * 20), 1);
}

#[test]
fn destroyed_item_never_fires() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let item = reaper.add(counter_cb(&fired)).unwrap();

    item.destroy();
    item.destroy(); // idempotent
    assert_eq!(reaper.size(), 0);

    std::thread::sleep(TICK * 4);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn dropping_handle_destroys_item() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    drop(reaper.add(counter_cb(&fired)).unwrap());

    assert_eq!(reaper.size(), 0);
    std::thread::sleep(TICK * 4);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn shutdown_without_callback_policy_discards_survivors() {
    let reaper = Reaper::create(TICK, TICK * 100, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let _item = reaper.add(counter_cb(&fired)).unwrap();

    reaper.shutdown();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn shutdown_with_callback_policy_fires_all_survivors_once() {
    let reaper = Reaper::create(TICK, TICK * 100, DestroyPolicy::CallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let _a = reaper.add(counter_cb(&fired)).unwrap();
    let _b = reaper.add(counter_cb(&fired)).unwrap();

    reaper.shutdown();
    reaper.shutdown(); // idempotent
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn add_after_shutdown_is_logic_error() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    reaper.shutdown();
    let fired = Arc::new(AtomicUsize::new(0));
    assert!(matches!(reaper.add(counter_cb(&fired)), Err(Error::LogicError(_))));
}

#[test]
fn handle_outlives_reaper_safely() {
    let fired = Arc::new(AtomicUsize::new(0));
    let item = {
        let reaper = Reaper::create(TICK, TICK * 100, DestroyPolicy::NoCallbackOnDestroy).unwrap();
        reaper.add(counter_cb(&fired)).unwrap()
    };

    // The reaper is gone; handle methods are no-ops.
    item.refresh();
    item.destroy();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn callback_may_call_back_into_the_reaper() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let reaper_ref = Arc::clone(&reaper);
    let sizes_ref = Arc::clone(&sizes);
    let _item = reaper
        .add(Arc::new(move || {
            sizes_ref.lock().push(reaper_ref.size());
        }))
        .unwrap();

    let start = Instant::now();
    while sizes.lock().is_empty() && start.elapsed() < TICK * 20 {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(sizes.lock().as_slice(), &[0]);
}

#[test]
fn panicking_callback_is_swallowed() {
    let reaper = Reaper::create(TICK, TICK, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let _bad = reaper
        .add(Arc::new(|| {
            panic!("scope callback misbehaved");
        }))
        .unwrap();
    let _good = reaper.add(counter_cb(&fired)).unwrap();

    // The panic from the first callback must not kill the worker.
    assert_eq!(wait_for(&fired, 1, TICK * 20), 1);
}

#[test]
fn equal_intervals_bound_item_lifetime() {
    // With reap == expiry, lifetime is within [expiry, 2 * expiry).
    let expiry = TICK * 2;
    let reaper = Reaper::create(expiry, expiry, DestroyPolicy::NoCallbackOnDestroy).unwrap();
    let fired_at = Arc::new(Mutex::new(None));
    let fired_ref = Arc::clone(&fired_at);
    let start = Instant::now();
    let _item = reaper
        .add(Arc::new(move || {
            fired_ref.lock().get_or_insert_with(Instant::now);
        }))
        .unwrap();

    let deadline = Instant::now() + expiry * 10;
    while fired_at.lock().is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    let fired = (*fired_at.lock()).unwrap_or_else(Instant::now);
    let lifetime = fired - start;
    assert!(lifetime >= expiry, "fired too early: {:?}", lifetime);
    // Generous upper bound to stay robust on slow machines.
    assert!(lifetime < expiry * 4, "fired too late: {:?}", lifetime);
}
