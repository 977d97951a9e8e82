// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Receiver capability set for reply streams.
//!
//! The reply object is the sole producer of these callbacks; applications
//! implement the trait and override the pushes they care about. `finished`
//! is always the last callback delivered, exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::category::Category;
use crate::result::CategorisedResult;
use crate::variant::{Variant, VariantMap};

/// Why a reply stream ended. Travels verbatim in the terminal wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishedReason {
    Finished,
    Cancelled,
    Error,
}

impl FinishedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishedReason::Finished => "finished",
            FinishedReason::Cancelled => "cancelled",
            FinishedReason::Error => "error",
        }
    }
}

impl std::fmt::Display for FinishedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callbacks a client supplies to receive the results of one query.
///
/// Push hooks default to doing nothing so receivers only implement what
/// they display. Callbacks may arrive from an arbitrary thread; a callback
/// that panics is caught at the reply-object boundary and dropped.
pub trait SearchReceiver: Send + Sync {
    fn push_category(&self, _category: Arc<Category>) {}

    fn push_result(&self, _result: CategorisedResult) {}

    fn push_annotation(&self, _annotation: Annotation) {}

    fn push_filters(&self, _filters: Vec<Variant>, _filter_state: VariantMap) {}

    fn push_preview_data(&self, _data: VariantMap) {}

    fn push_widgets(&self, _widgets: Vec<Variant>) {}

    /// Terminal callback. `message` is empty unless `reason` is `Error`.
    fn finished(&self, reason: FinishedReason, message: &str);
}
