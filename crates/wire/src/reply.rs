// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-way messages on a reply stream, scope → client.

use scopes_core::{FinishedReason, VariantMap};
use serde::{Deserialize, Serialize};

/// Messages a scope writes to the client's reply endpoint. All pushes for
/// one reply travel one connection, so arrival order is issue order;
/// `Finished` is always last.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReplyMessage {
    /// Identity handshake: first message on a reply connection, naming the
    /// reply servant the stream belongs to.
    Hello { reply_id: String },

    /// One push payload: a map with a single entry keyed `"category"`,
    /// `"result"`, `"annotation"`, `"filters"`/`"filter_state"`,
    /// `"preview-data"`, or `"widgets"`.
    Push { payload: VariantMap },

    /// Terminal message; nothing follows.
    Finished { reason: FinishedReason, message: String },
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
