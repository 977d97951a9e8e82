// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side query object: owns the cancellation flag for one running
//! query and fans cancellation out to subqueries.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use scopes_core::FinishedReason;
use tracing::warn;

use crate::proxy::QueryCtrlProxy;
use crate::scope::{SearchContext, SearchQuery};
use crate::search_reply::{ReplyImpl, SearchReply};

pub(crate) struct QueryObject {
    query: Box<dyn SearchQuery>,
    pushable: AtomicBool,
    reply: Mutex<Option<Weak<ReplyImpl>>>,
    subqueries: Mutex<Vec<QueryCtrlProxy>>,
}

impl QueryObject {
    pub(crate) fn new(query: Box<dyn SearchQuery>) -> Arc<Self> {
        Arc::new(Self {
            query,
            pushable: AtomicBool::new(true),
            reply: Mutex::new(None),
            subqueries: Mutex::new(Vec::new()),
        })
    }

    /// Whether pushes are still allowed. Checked before every enqueue.
    pub(crate) fn pushable(&self) -> bool {
        self.pushable.load(Ordering::Acquire)
    }

    pub(crate) fn set_reply(&self, reply: Weak<ReplyImpl>) {
        *self.reply.lock() = Some(reply);
    }

    /// Remember a subquery control proxy so a cancel of this query cancels
    /// the subquery too.
    pub(crate) fn register_subquery(&self, ctrl: QueryCtrlProxy) {
        self.subqueries.lock().push(ctrl);
    }

    /// Run the user's search on the calling (blocking) thread. Errors and
    /// panics escape as a terminal `Error` on the reply.
    pub(crate) fn run(&self, ctx: SearchContext, reply: SearchReply) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.query.run(&ctx, &reply)));
        match outcome {
            Ok(Ok(())) => {
                // The reply finishes when the last handle is dropped; the
                // user may have stored a clone for later pushes.
            }
            Ok(Err(e)) => reply.error(e.message()),
            Err(_) => reply.error("unhandled error in search query"),
        }
    }

    /// Cancel this query: flip the pushable flag, run the user hook,
    /// cancel outstanding subqueries, and finish the reply with
    /// `Cancelled`. One-shot; later calls are no-ops.
    pub(crate) async fn cancel(&self) {
        if !self.pushable.swap(false, Ordering::AcqRel) {
            return;
        }

        if catch_unwind(AssertUnwindSafe(|| self.query.cancelled())).is_err() {
            warn!("cancelled hook panicked");
        }

        let subqueries: Vec<QueryCtrlProxy> =
            std::mem::take(&mut *self.subqueries.lock());
        for ctrl in subqueries {
            if let Err(e) = ctrl.cancel().await {
                warn!("subquery cancel failed: {}", e);
            }
        }

        let reply = self.reply.lock().clone();
        if let Some(reply) = reply.and_then(|weak| weak.upgrade()) {
            reply.finished_async(FinishedReason::Cancelled, "").await;
        }
    }
}

#[cfg(test)]
#[path = "query_object_tests.rs"]
mod tests;
