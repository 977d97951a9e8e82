// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between clients, scope processes, and the registry.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod endpoint;
mod frame;
mod reply;
mod request;
mod response;

pub use endpoint::{Endpoint, WireListener, WireStream};
pub use frame::{
    decode, encode, read_frame, read_message, write_frame, write_message, ProtocolError,
    MAX_FRAME_LEN,
};
pub use reply::ReplyMessage;
pub use request::Request;
pub use response::Response;
