// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope-side reply API.
//!
//! A [`SearchReply`] is handed to the user's query `run`; pushes are
//! forwarded over the reply connection by a writer task, one channel per
//! reply, so ordering is the order of the push calls. Every push first
//! checks the owning query's pushable flag, so a cancel that
//! happens-before a push guarantees that push reports false.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use scopes_core::{
    Annotation, CategorisedResult, Category, CategoryRenderer, Error, FinishedReason, Result,
    Variant, VariantMap,
};
use scopes_wire::{write_frame, Endpoint, ReplyMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::category_registry::CategoryRegistry;
use crate::query_object::QueryObject;

/// Per-reply channel capacity; pushes beyond it block until the writer
/// drains.
const REPLY_CHANNEL_CAPACITY: usize = 64;

/// Bound on a single reply write; a consumer that stops reading for this
/// long kills the stream.
const REPLY_WRITE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Sending half of one reply stream.
pub(crate) struct ReplyConn {
    tx: mpsc::Sender<ReplyMessage>,
}

impl ReplyConn {
    pub(crate) fn new(tx: mpsc::Sender<ReplyMessage>) -> Self {
        Self { tx }
    }

    fn send_blocking(&self, message: ReplyMessage) -> Result<()> {
        self.tx
            .blocking_send(message)
            .map_err(|_| Error::MiddlewareError("reply stream closed".into()))
    }

    async fn send(&self, message: ReplyMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| Error::MiddlewareError("reply stream closed".into()))
    }

    fn try_send(&self, message: ReplyMessage) -> Result<()> {
        self.tx
            .try_send(message)
            .map_err(|_| Error::MiddlewareError("reply stream closed or congested".into()))
    }
}

/// Writer task: connects to the client's reply endpoint, performs the
/// identity handshake, then forwards messages until the terminal one.
pub(crate) async fn reply_writer(
    endpoint: Endpoint,
    reply_id: String,
    mut rx: mpsc::Receiver<ReplyMessage>,
) {
    let mut stream = match endpoint.connect().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%endpoint, "cannot open reply stream: {}", e);
            return;
        }
    };
    let hello = ReplyMessage::Hello { reply_id };
    if let Err(e) = write_frame(&mut stream, &hello, REPLY_WRITE_TIMEOUT).await {
        warn!(%endpoint, "reply handshake failed: {}", e);
        return;
    }
    while let Some(message) = rx.recv().await {
        let terminal = matches!(message, ReplyMessage::Finished { .. });
        if let Err(e) = write_frame(&mut stream, &message, REPLY_WRITE_TIMEOUT).await {
            debug!(%endpoint, "reply stream write failed: {}", e);
            break;
        }
        if terminal {
            break;
        }
    }
    // Dropping rx makes any in-flight sender fail, which surfaces as
    // push() == false on the scope side.
}

pub(crate) struct ReplyImpl {
    conn: ReplyConn,
    query: Arc<QueryObject>,
    cat_registry: Mutex<CategoryRegistry>,
    finished: AtomicBool,
}

impl ReplyImpl {
    pub(crate) fn new(conn: ReplyConn, query: Arc<QueryObject>) -> Arc<Self> {
        Arc::new(Self {
            conn,
            query,
            cat_registry: Mutex::new(CategoryRegistry::new()),
            finished: AtomicBool::new(false),
        })
    }

    fn push_map(&self, payload: VariantMap) -> bool {
        if !self.query.pushable() || self.finished.load(Ordering::Acquire) {
            return false;
        }
        match self.conn.send_blocking(ReplyMessage::Push { payload }) {
            Ok(()) => true,
            Err(e) => {
                // Transport failure: absorb into a terminal error.
                if !self.finished.swap(true, Ordering::AcqRel) {
                    let _ = self.conn.try_send(ReplyMessage::Finished {
                        reason: FinishedReason::Error,
                        message: e.message().to_string(),
                    });
                }
                false
            }
        }
    }

    fn push_single(&self, key: &str, value: Variant) -> bool {
        let mut payload = VariantMap::new();
        payload.insert(key.to_string(), value);
        self.push_map(payload)
    }

    pub(crate) fn finished_blocking(&self, reason: FinishedReason, message: &str) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let terminal =
            ReplyMessage::Finished { reason, message: message.to_string() };
        if self.conn.send_blocking(terminal).is_err() {
            debug!("terminal reply message lost (stream closed)");
        }
    }

    pub(crate) async fn finished_async(&self, reason: FinishedReason, message: &str) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let terminal =
            ReplyMessage::Finished { reason, message: message.to_string() };
        if self.conn.send(terminal).await.is_err() {
            debug!("terminal reply message lost (stream closed)");
        }
    }
}

impl Drop for ReplyImpl {
    fn drop(&mut self) {
        // Safety net: an unfinished reply ends cleanly when the last
        // handle goes away.
        if !self.finished.swap(true, Ordering::AcqRel) {
            let terminal = ReplyMessage::Finished {
                reason: FinishedReason::Finished,
                message: String::new(),
            };
            if self.conn.try_send(terminal).is_err() {
                debug!("implicit finished lost (stream closed)");
            }
        }
    }
}

/// The reply handle a scope pushes results through. Cloneable; the reply
/// finishes implicitly when the last clone is dropped, or explicitly via
/// [`finished`](SearchReply::finished) / [`error`](SearchReply::error).
#[derive(Clone)]
pub struct SearchReply {
    inner: Arc<ReplyImpl>,
}

impl SearchReply {
    pub(crate) fn new(inner: Arc<ReplyImpl>) -> Self {
        Self { inner }
    }

    /// Register a new category and push it to the client. The id must be
    /// unique on this reply.
    pub fn register_category(
        &self,
        id: &str,
        title: &str,
        icon: &str,
        renderer_template: CategoryRenderer,
    ) -> Result<Arc<Category>> {
        let category =
            self.inner.cat_registry.lock().register_with(id, title, icon, renderer_template)?;
        self.inner.push_single("category", Variant::Map(category.serialize()));
        Ok(category)
    }

    /// Register a category received from another reply (aggregator path).
    pub fn register_existing_category(&self, category: Category) -> Result<Arc<Category>> {
        let category = self.inner.cat_registry.lock().register(category)?;
        self.inner.push_single("category", Variant::Map(category.serialize()));
        Ok(category)
    }

    pub fn lookup_category(&self, id: &str) -> Option<Arc<Category>> {
        self.inner.cat_registry.lock().lookup(id)
    }

    /// Push one result. Its category must have been registered on this
    /// reply. Returns false once the query is cancelled or the reply
    /// finished.
    pub fn push(&self, result: &CategorisedResult) -> Result<bool> {
        let cat_id = result.category().id();
        if self.inner.cat_registry.lock().lookup(cat_id).is_none() {
            return Err(Error::InvalidArgument(format!("unknown category {}", cat_id)));
        }
        Ok(self.inner.push_single("result", Variant::Map(result.serialize())))
    }

    pub fn push_annotation(&self, annotation: &Annotation) -> Result<bool> {
        annotation.validate()?;
        Ok(self.inner.push_single("annotation", to_variant(annotation)?))
    }

    pub fn push_filters(&self, filters: &[Variant], filter_state: &VariantMap) -> Result<bool> {
        let mut payload = VariantMap::new();
        payload.insert("filters".into(), Variant::Array(filters.to_vec()));
        payload.insert("filter_state".into(), Variant::Map(filter_state.clone()));
        Ok(self.inner.push_map(payload))
    }

    pub fn push_preview_data(&self, key: &str, value: Variant) -> Result<bool> {
        let mut nested = VariantMap::new();
        nested.insert(key.to_string(), value);
        Ok(self.inner.push_single("preview-data", Variant::Map(nested)))
    }

    pub fn push_widgets(&self, widgets: &[Variant]) -> Result<bool> {
        Ok(self.inner.push_single("widgets", Variant::Array(widgets.to_vec())))
    }

    /// Finish the reply normally. Idempotent.
    pub fn finished(&self) {
        self.inner.finished_blocking(FinishedReason::Finished, "");
    }

    /// Finish the reply with an error. Idempotent with `finished`.
    pub fn error(&self, message: &str) {
        self.inner.finished_blocking(FinishedReason::Error, message);
    }
}

fn to_variant<T: serde::Serialize>(value: &T) -> Result<Variant> {
    let json = serde_json::to_value(value)
        .map_err(|e| Error::MiddlewareError(format!("cannot serialise payload: {}", e)))?;
    serde_json::from_value(json)
        .map_err(|e| Error::MiddlewareError(format!("cannot serialise payload: {}", e)))
}

#[cfg(test)]
#[path = "search_reply_tests.rs"]
mod tests;
