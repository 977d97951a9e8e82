// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scopes-runtime: the client/scope runtime — reaper, reply machinery,
//! query objects, proxies, and the process-wide `Runtime` facade.

pub mod category_registry;
pub mod config;
pub mod logging;
pub mod proxy;
pub mod reaper;
pub mod reply_object;
pub mod scope;

mod query_object;
mod runtime;
mod search_reply;
mod server;

pub use category_registry::CategoryRegistry;
pub use config::{RuntimeConfig, REAP_DISABLED};
pub use logging::init_logging;
pub use proxy::{Middleware, QueryCtrlProxy, RegistryProxy, ScopeProxy, SocketMiddleware};
pub use reaper::{DestroyPolicy, ReapItem, Reaper, ReaperCallback};
pub use reply_object::ReplyObject;
pub use runtime::Runtime;
pub use scope::{ScopeBase, SearchContext, SearchQuery};
pub use search_reply::SearchReply;
