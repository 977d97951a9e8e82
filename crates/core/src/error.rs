// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every component of the runtime.
//!
//! Synchronous API calls return these directly; errors raised inside a reply
//! push are absorbed into a terminal `finished(Error, message)` callback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A caller supplied a malformed or out-of-range argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A named entity (scope, category, query) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// API misuse: operation on a finalised or torn-down object.
    #[error("logic error: {0}")]
    LogicError(String),

    /// File I/O, process spawn, or default-directory failure.
    #[error("resource error: {0}")]
    ResourceError(String),

    /// Transport or codec failure.
    #[error("middleware error: {0}")]
    MiddlewareError(String),

    /// A bounded wait elapsed without the expected event.
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Wire-transportable discriminant so the taxonomy survives a round trip
/// through a remote `Error` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    LogicError,
    ResourceError,
    MiddlewareError,
    Timeout,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::LogicError(_) => ErrorKind::LogicError,
            Error::ResourceError(_) => ErrorKind::ResourceError,
            Error::MiddlewareError(_) => ErrorKind::MiddlewareError,
            Error::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Reconstruct an error from its wire form.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidArgument => Error::InvalidArgument(message),
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::LogicError => Error::LogicError(message),
            ErrorKind::ResourceError => Error::ResourceError(message),
            ErrorKind::MiddlewareError => Error::MiddlewareError(message),
            ErrorKind::Timeout => Error::Timeout(message),
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(m)
            | Error::NotFound(m)
            | Error::LogicError(m)
            | Error::ResourceError(m)
            | Error::MiddlewareError(m)
            | Error::Timeout(m) => m,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
