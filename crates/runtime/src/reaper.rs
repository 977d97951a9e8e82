// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LRU-ordered expiration engine shared by many callers.
//!
//! Items live in a list ordered most-recently-refreshed-first. An item that
//! is not refreshed within the expiry interval is removed and its callback
//! invoked. One worker thread serves the whole list, so callbacks must not
//! block for any length of time.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use scopes_core::{Error, Result};
use tracing::warn;

/// Invoked when an item expires without a refresh.
pub type ReaperCallback = Arc<dyn Fn() + Send + Sync>;

/// What happens to surviving items when the reaper shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyPolicy {
    /// Surviving callbacks are discarded on shutdown.
    NoCallbackOnDestroy,
    /// Surviving callbacks are all invoked once on shutdown, expired or not.
    CallbackOnDestroy,
}

struct Node {
    cb: ReaperCallback,
    timestamp: Instant,
    prev: Option<u64>,
    next: Option<u64>,
}

/// Doubly-linked LRU list threaded through a key map. Keys are never
/// reused, so a stale handle simply misses.
#[derive(Default)]
struct ReapList {
    nodes: HashMap<u64, Node>,
    head: Option<u64>,
    tail: Option<u64>,
    next_key: u64,
}

impl ReapList {
    fn push_front(&mut self, cb: ReaperCallback, now: Instant) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        let node = Node { cb, timestamp: now, prev: None, next: self.head };
        if let Some(old_head) = self.head {
            if let Some(n) = self.nodes.get_mut(&old_head) {
                n.prev = Some(key);
            }
        }
        self.nodes.insert(key, node);
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
        key
    }

    fn unlink(&mut self, key: u64) -> Option<Node> {
        let node = self.nodes.remove(&key)?;
        match node.prev {
            Some(prev) => {
                if let Some(n) = self.nodes.get_mut(&prev) {
                    n.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(n) = self.nodes.get_mut(&next) {
                    n.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
        Some(node)
    }

    /// Unlink and re-insert at the head under the same key, stamping a
    /// fresh timestamp.
    fn refresh(&mut self, key: u64, now: Instant) -> bool {
        let Some(mut node) = self.unlink(key) else {
            return false;
        };
        node.timestamp = now;
        node.prev = None;
        node.next = self.head;
        if let Some(old_head) = self.head {
            if let Some(n) = self.nodes.get_mut(&old_head) {
                n.prev = Some(key);
            }
        }
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
        self.nodes.insert(key, node);
        true
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn tail_timestamp(&self) -> Option<Instant> {
        self.tail.and_then(|k| self.nodes.get(&k)).map(|n| n.timestamp)
    }

    /// Keys of expired items, oldest first. Strict "still alive" comparison:
    /// an item exactly `expiry` old is collected.
    fn expired(&self, now: Instant, expiry: Duration) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut cursor = self.tail;
        while let Some(key) = cursor {
            let Some(node) = self.nodes.get(&key) else { break };
            if now < node.timestamp + expiry {
                break; // LRU order: the rest are younger.
            }
            keys.push(key);
            cursor = node.prev;
        }
        keys
    }

    fn all_keys(&self) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut cursor = self.tail;
        while let Some(key) = cursor {
            let Some(node) = self.nodes.get(&key) else { break };
            keys.push(key);
            cursor = node.prev;
        }
        keys
    }
}

struct ReaperState {
    list: ReapList,
    finish: bool,
}

struct ReaperCore {
    state: Mutex<ReaperState>,
    do_work: Condvar,
    reap_interval: Duration,
    expiry_interval: Duration,
    policy: DestroyPolicy,
}

impl ReaperCore {
    /// Worker loop. Sleeps until the oldest item could have expired (never
    /// more often than once per reap interval), collects expired items
    /// under the lock, then fires their callbacks outside it.
    fn reap_loop(&self) {
        let mut state = self.state.lock();
        loop {
            if state.list.is_empty() {
                // Nothing to reap; sleep until an add or shutdown.
                self.do_work.wait_while(&mut state, |s| s.list.is_empty() && !s.finish);
            } else {
                let now = Instant::now();
                let oldest_age = state
                    .list
                    .tail_timestamp()
                    .map(|t| now.saturating_duration_since(t))
                    .unwrap_or_default();
                let sleep =
                    self.expiry_interval.saturating_sub(oldest_age).max(self.reap_interval);
                let deadline = now + sleep;
                while !state.finish {
                    if self.do_work.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
            }

            if state.finish && self.policy == DestroyPolicy::NoCallbackOnDestroy {
                return;
            }

            // Collect zombies under the lock; the final pass for
            // CallbackOnDestroy takes everything, expired or not.
            let keys = if state.finish && self.policy == DestroyPolicy::CallbackOnDestroy {
                state.list.all_keys()
            } else {
                state.list.expired(Instant::now(), self.expiry_interval)
            };

            let mut zombies = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(node) = state.list.unlink(key) {
                    zombies.push(node.cb);
                }
            }

            // Callbacks run outside the lock so they may call back into the
            // reaper without deadlock.
            drop(state);
            for cb in zombies {
                if catch_unwind(AssertUnwindSafe(|| cb())).is_err() {
                    warn!("reaper callback panicked");
                }
            }
            state = self.state.lock();

            if state.finish {
                return;
            }
        }
    }
}

/// Handle for one reaped item, returned from [`Reaper::add`].
///
/// `refresh` renews the timestamp; `destroy` removes the item without
/// invoking its callback. Both are no-ops after `destroy` or once the
/// reaper is gone. Dropping the handle destroys the item.
pub struct ReapItem {
    core: Weak<ReaperCore>,
    key: u64,
    destroyed: AtomicBool,
}

impl ReapItem {
    /// Re-link the item at the head of the list with a fresh timestamp. O(1).
    pub fn refresh(&self) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        match self.core.upgrade() {
            Some(core) => {
                let mut state = core.state.lock();
                state.list.refresh(self.key, Instant::now());
            }
            None => {
                // The reaper has gone away; disable ourselves.
                self.destroyed.store(true, Ordering::Release);
            }
        }
    }

    /// Unlink the item without invoking the callback. Idempotent. O(1).
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(core) = self.core.upgrade() {
            let mut state = core.state.lock();
            state.list.unlink(self.key);
        }
    }
}

impl Drop for ReapItem {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// The expiration engine. One worker thread scans the list and fires
/// callbacks for items that were not refreshed in time.
pub struct Reaper {
    core: Arc<ReaperCore>,
    worker: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl Reaper {
    /// Create a reaper and start its worker thread.
    ///
    /// The worker runs at most once every `reap_interval`; entries are
    /// reaped once they are at least `expiry_interval` old, so actual item
    /// lifetime falls in `[expiry_interval, expiry_interval + reap_interval)`.
    pub fn create(
        reap_interval: Duration,
        expiry_interval: Duration,
        policy: DestroyPolicy,
    ) -> Result<Arc<Reaper>> {
        if reap_interval.is_zero() || expiry_interval.is_zero() {
            return Err(Error::InvalidArgument(format!(
                "reaper intervals must be positive (reap {:?}, expiry {:?})",
                reap_interval, expiry_interval
            )));
        }
        if reap_interval > expiry_interval {
            return Err(Error::InvalidArgument(format!(
                "reap interval ({:?}) must not exceed expiry interval ({:?})",
                reap_interval, expiry_interval
            )));
        }

        let core = Arc::new(ReaperCore {
            state: Mutex::new(ReaperState { list: ReapList::default(), finish: false }),
            do_work: Condvar::new(),
            reap_interval,
            expiry_interval,
            policy,
        });

        let worker_core = Arc::clone(&core);
        let handle = std::thread::Builder::new()
            .name("reaper".into())
            .spawn(move || worker_core.reap_loop())
            .map_err(|e| Error::ResourceError(format!("failed to start reaper thread: {}", e)))?;

        Ok(Arc::new(Reaper { core, worker: Mutex::new(Some(handle)) }))
    }

    /// Add an item; the callback fires if the item is not refreshed within
    /// the expiry interval. O(1).
    ///
    /// The callback is invoked synchronously by the single worker thread
    /// and must return quickly.
    pub fn add(&self, cb: ReaperCallback) -> Result<ReapItem> {
        let mut state = self.core.state.lock();
        if state.finish {
            return Err(Error::LogicError("cannot add item to a reaper that is shutting down".into()));
        }
        let key = state.list.push_front(cb, Instant::now());
        if state.list.len() == 1 {
            self.do_work_notify();
        }
        Ok(ReapItem {
            core: Arc::downgrade(&self.core),
            key,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Number of items currently on the list. O(1).
    pub fn size(&self) -> usize {
        self.core.state.lock().list.len()
    }

    /// Stop the worker and join it. Depending on the destroy policy the
    /// surviving callbacks are invoked or discarded. Idempotent; also
    /// called on drop.
    pub fn shutdown(&self) {
        {
            let mut state = self.core.state.lock();
            if state.finish {
                return;
            }
            state.finish = true;
            self.do_work_notify();
        }
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn do_work_notify(&self) {
        self.core.do_work.notify_one();
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
