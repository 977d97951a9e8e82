// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses from scope and registry servants.

use scopes_core::{Error, ErrorKind, ScopeMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Liveness probe response
    Pong,

    /// Query accepted; the id addresses Cancel/Destroy requests
    QueryCreated { query_id: String },

    /// Metadata for one scope
    Metadata { metadata: ScopeMetadata },

    /// All known scopes
    ScopeList { scopes: Vec<ScopeMetadata> },

    /// Registry is shutting down
    ShuttingDown,

    /// Error response, preserving the taxonomy kind
    Error { kind: ErrorKind, message: String },
}

impl Response {
    /// Wrap an error for the wire.
    pub fn error(err: &Error) -> Self {
        Response::Error { kind: err.kind(), message: err.message().to_string() }
    }

    /// Unwrap an error response back into the taxonomy; `Ok(self)` for
    /// everything else.
    pub fn into_result(self) -> Result<Response, Error> {
        match self {
            Response::Error { kind, message } => Err(Error::from_kind(kind, message)),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
