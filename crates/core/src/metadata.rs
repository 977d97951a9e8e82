// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope metadata: the registry's description of one installed scope.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable description of an installed scope. Owned exclusively by the
/// registry; clients receive copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeMetadata {
    pub scope_id: String,
    pub display_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_key: Option<String>,
    #[serde(default)]
    pub overrideable: bool,
    /// Endpoint at which the scope's worker process publishes itself.
    pub endpoint: String,
}

impl ScopeMetadata {
    /// Validate the invariants the registry relies on.
    pub fn validate(&self) -> Result<()> {
        if self.scope_id.is_empty() {
            return Err(Error::InvalidArgument("scope with empty id".into()));
        }
        if self.scope_id.contains('/') {
            return Err(Error::InvalidArgument(format!(
                "scope id must not contain a slash: {:?}",
                self.scope_id
            )));
        }
        if self.display_name.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "scope {:?} without display name",
                self.scope_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
