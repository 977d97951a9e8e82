// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The traits a scope author implements, and the per-query context the
//! runtime hands to a running search.

use std::sync::{Arc, Weak};

use scopes_core::{CannedQuery, Error, Result, SearchReceiver};

use crate::proxy::{QueryCtrlProxy, ScopeProxy};
use crate::query_object::QueryObject;
use crate::search_reply::SearchReply;

/// One running search. `run` executes on a worker thread and may push
/// synchronously for as long as it likes; `cancelled` is invoked at most
/// once, possibly concurrently with `run`.
pub trait SearchQuery: Send + Sync {
    fn run(&self, ctx: &SearchContext, reply: &SearchReply) -> Result<()>;

    /// Hook invoked when the client cancels. Long-running `run`
    /// implementations should poll their pushes' return values instead of
    /// relying on this.
    fn cancelled(&self) {}
}

/// A scope implementation, hosted by [`Runtime::run_scope`](crate::Runtime::run_scope).
pub trait ScopeBase: Send + Sync {
    /// Called once before the scope starts accepting queries.
    fn start(&self, _scope_id: &str) -> Result<()> {
        Ok(())
    }

    /// Called once after the scope stops accepting queries.
    fn stop(&self) {}

    /// Produce a query object for one search request.
    fn search(&self, query: &CannedQuery) -> Result<Box<dyn SearchQuery>>;
}

/// Runtime context for one running query. Its main job is subquery
/// fan-out: subqueries created here are cancelled when the parent query
/// is cancelled.
pub struct SearchContext {
    handle: tokio::runtime::Handle,
    query_object: Weak<QueryObject>,
}

impl SearchContext {
    pub(crate) fn new(handle: tokio::runtime::Handle, query_object: Weak<QueryObject>) -> Self {
        Self { handle, query_object }
    }

    /// Issue a subquery to another scope. The returned control proxy is
    /// also registered with the parent query, so cancelling the parent
    /// cancels the subquery exactly once.
    pub fn subsearch(
        &self,
        scope: &ScopeProxy,
        query_string: &str,
        receiver: Arc<dyn SearchReceiver>,
    ) -> Result<QueryCtrlProxy> {
        let query_object = self
            .query_object
            .upgrade()
            .ok_or_else(|| Error::LogicError("query is gone".into()))?;
        if !query_object.pushable() {
            return Err(Error::LogicError("query was cancelled".into()));
        }
        let query = CannedQuery::with_query(scope.scope_id(), query_string, "");
        let ctrl = self.handle.block_on(scope.create_query(query, receiver))?;
        query_object.register_subquery(ctrl.clone());
        Ok(ctrl)
    }
}
