// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Receiver-side reply servant.
//!
//! Sits between the transport and the application-supplied receiver,
//! demultiplexing raw push payloads into typed callbacks and enforcing the
//! reply invariants: category ids are unique, results reference registered
//! categories, and exactly one terminal callback is ever delivered.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use scopes_core::{
    Annotation, Category, CategorisedResult, Error, FinishedReason, Result, SearchReceiver,
    Variant, VariantMap,
};
use tracing::warn;

use crate::category_registry::CategoryRegistry;
use crate::reaper::{ReapItem, Reaper};

/// Message used when the reaper expires an idle reply.
pub const PUSH_INTERVAL_EXCEEDED: &str = "push interval exceeded";

pub struct ReplyObject {
    receiver: Arc<dyn SearchReceiver>,
    finished: AtomicBool,
    pending: Mutex<i32>,
    idle: Condvar,
    cat_registry: Mutex<CategoryRegistry>,
    reap_item: Mutex<Option<ReapItem>>,
}

impl ReplyObject {
    /// Create a servant for one reply stream. With a reaper, the stream is
    /// forced to `finished(Error, ..)` if no push arrives within the
    /// reaper's expiry interval.
    pub fn new(
        receiver: Arc<dyn SearchReceiver>,
        reaper: Option<&Arc<Reaper>>,
    ) -> Result<Arc<Self>> {
        let reply = Arc::new(Self {
            receiver,
            finished: AtomicBool::new(false),
            pending: Mutex::new(0),
            idle: Condvar::new(),
            cat_registry: Mutex::new(CategoryRegistry::new()),
            reap_item: Mutex::new(None),
        });
        if let Some(reaper) = reaper {
            let weak = Arc::downgrade(&reply);
            let item = reaper.add(Arc::new(move || {
                if let Some(reply) = weak.upgrade() {
                    reply.finished(FinishedReason::Error, PUSH_INTERVAL_EXCEEDED);
                }
            }))?;
            *reply.reap_item.lock() = Some(item);
        }
        Ok(reply)
    }

    /// Deliver one raw push payload.
    ///
    /// Returns false once the reply is finished; a malformed or invariant-
    /// violating payload finishes the reply with `Error` and also returns
    /// false. A panicking receiver callback is swallowed.
    pub fn push(&self, payload: VariantMap) -> bool {
        {
            let mut pending = self.pending.lock();
            if self.finished.load(Ordering::Acquire) {
                return false;
            }
            *pending += 1;
        }
        if let Some(item) = &*self.reap_item.lock() {
            item.refresh();
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(payload)));

        {
            let mut pending = self.pending.lock();
            *pending -= 1;
            if *pending == 0 {
                self.idle.notify_all();
            }
        }

        match outcome {
            Ok(Ok(())) => !self.finished.load(Ordering::Acquire),
            Ok(Err(e)) => {
                self.finished(FinishedReason::Error, e.message());
                false
            }
            Err(_) => {
                warn!("receiver push callback panicked");
                !self.finished.load(Ordering::Acquire)
            }
        }
    }

    /// Deliver the terminal callback. Only the first call has any effect;
    /// in-flight pushes complete first.
    pub fn finished(&self, reason: FinishedReason, message: &str) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(item) = self.reap_item.lock().take() {
            item.destroy();
        }
        {
            let mut pending = self.pending.lock();
            while *pending > 0 {
                self.idle.wait(&mut pending);
            }
        }
        let receiver = Arc::clone(&self.receiver);
        if catch_unwind(AssertUnwindSafe(|| receiver.finished(reason, message))).is_err() {
            warn!("receiver finished callback panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn dispatch(&self, payload: VariantMap) -> Result<()> {
        if let Some(value) = payload.get("category") {
            let map = payload_map(value, "category")?;
            let category = Category::deserialize(map)?;
            let category = self.cat_registry.lock().register(category)?;
            self.receiver.push_category(category);
            return Ok(());
        }
        if let Some(value) = payload.get("result") {
            let map = payload_map(value, "result")?;
            let cat_id = match map.get("cat_id") {
                Some(Variant::Str(id)) => id.clone(),
                _ => return Err(Error::InvalidArgument("result without category id".into())),
            };
            let category = self.cat_registry.lock().lookup(&cat_id).ok_or_else(|| {
                Error::InvalidArgument(format!("result for unknown category {}", cat_id))
            })?;
            let result = CategorisedResult::deserialize(map, category)?;
            self.receiver.push_result(result);
            return Ok(());
        }
        if let Some(value) = payload.get("annotation") {
            let annotation: Annotation = from_variant(value, "annotation")?;
            self.receiver.push_annotation(annotation);
            return Ok(());
        }
        if let Some(value) = payload.get("filters") {
            let filters = match value {
                Variant::Array(a) => a.clone(),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "filters payload holds a {}",
                        other.type_name()
                    )))
                }
            };
            let state = match payload.get("filter_state") {
                Some(Variant::Map(m)) => m.clone(),
                _ => VariantMap::new(),
            };
            self.receiver.push_filters(filters, state);
            return Ok(());
        }
        if let Some(value) = payload.get("preview-data") {
            let map = payload_map(value, "preview-data")?;
            self.receiver.push_preview_data(map.clone());
            return Ok(());
        }
        if let Some(value) = payload.get("widgets") {
            let widgets = match value {
                Variant::Array(a) => a.clone(),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "widgets payload holds a {}",
                        other.type_name()
                    )))
                }
            };
            self.receiver.push_widgets(widgets);
            return Ok(());
        }
        Err(Error::InvalidArgument("unrecognised push payload".into()))
    }
}

impl Drop for ReplyObject {
    fn drop(&mut self) {
        // Safety net only; the transport adapter finishes explicitly.
        if !self.finished.load(Ordering::Acquire) {
            self.finished(FinishedReason::Finished, "");
        }
    }
}

fn payload_map<'a>(value: &'a Variant, key: &str) -> Result<&'a VariantMap> {
    match value {
        Variant::Map(m) => Ok(m),
        other => Err(Error::InvalidArgument(format!(
            "{} payload holds a {}",
            key,
            other.type_name()
        ))),
    }
}

fn from_variant<T: serde::de::DeserializeOwned>(value: &Variant, key: &str) -> Result<T> {
    let json = serde_json::to_value(value)
        .map_err(|e| Error::InvalidArgument(format!("{} payload: {}", key, e)))?;
    serde_json::from_value(json)
        .map_err(|e| Error::InvalidArgument(format!("{} payload: {}", key, e)))
}

#[cfg(test)]
#[path = "reply_object_tests.rs"]
mod tests;
