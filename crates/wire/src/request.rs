// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests carried from clients to scope and registry servants.

use scopes_core::CannedQuery;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness probe.
    Ping,

    /// Start a query on a scope. The scope streams `ReplyMessage`s to the
    /// caller-supplied reply endpoint, then the caller controls the query
    /// via the returned query id.
    CreateQuery {
        query: CannedQuery,
        reply_endpoint: String,
        /// Identity of the reply servant at that endpoint.
        reply_id: String,
    },

    /// Cancel a running query.
    CancelQuery { query_id: String },

    /// Drop all scope-side state for a query.
    DestroyQuery { query_id: String },

    /// Registry: metadata for one scope.
    GetMetadata { scope_id: String },

    /// Registry: all known scopes.
    ListScopes,

    /// Registry: ensure the scope's worker process is running and return
    /// its metadata.
    Locate { scope_id: String },

    /// Scope process → registry: the worker has bound its endpoint and is
    /// accepting queries.
    Ready { scope_id: String },

    /// Orderly registry shutdown.
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
