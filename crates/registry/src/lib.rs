// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scopes-registry: the scope catalog, worker-process lifecycle, and the
//! `scopereg` daemon.

pub mod bootstrap;
pub mod listener;
pub mod process;
pub mod registry_object;
pub mod scope_config;

pub use listener::ListenCtx;
pub use process::{ProcessState, ScopeProcess, READY_TIMEOUT, STOP_GRACE};
pub use registry_object::RegistryObject;
pub use scope_config::{RegistryConfig, ScopeConfig};
