// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration files consumed by the registry: per-scope description
//! files and the registry's own settings.

use std::path::{Path, PathBuf};

use scopes_core::{Error, Result, ScopeMetadata};
use serde::Deserialize;

/// One scope description file. Unknown keys are errors.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    pub scope_id: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub art: Option<String>,
    #[serde(default)]
    pub search_hint: Option<String>,
    #[serde(default)]
    pub hot_key: Option<String>,
    #[serde(default)]
    pub overrideable: bool,
}

impl ScopeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ResourceError(format!("cannot read scope config {:?}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            Error::InvalidArgument(format!("invalid scope config {:?}: {}", path.display(), e))
        })
    }

    /// Build the registry's metadata entry; the endpoint is where the
    /// worker will publish itself.
    pub fn into_metadata(self, endpoint: String) -> ScopeMetadata {
        ScopeMetadata {
            scope_id: self.scope_id,
            display_name: self.display_name,
            description: self.description,
            icon: self.icon,
            art: self.art,
            search_hint: self.search_hint,
            hot_key: self.hot_key,
            overrideable: self.overrideable,
            endpoint,
        }
    }
}

const REGISTRY_GROUP: &str = "Registry";
const SCOPERUNNER_PATH_KEY: &str = "Scoperunner.Path";
const REMOTE_REGISTRY_KEY: &str = "Remote.Registry";

/// Settings from `Registry.ConfigFile`: where the scoperunner binary
/// lives and, optionally, a remote registry to federate with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryConfig {
    pub scoperunner_path: Option<PathBuf>,
    pub remote_registry: Option<String>,
}

impl RegistryConfig {
    pub fn load(configfile: Option<&Path>) -> Result<Self> {
        let Some(path) = configfile else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ResourceError(format!(
                "cannot read registry config {:?}: {}",
                path.display(),
                e
            ))
        })?;
        let value: toml::Value = toml::from_str(&text).map_err(|e| {
            Error::InvalidArgument(format!(
                "malformed registry config {:?}: {}",
                path.display(),
                e
            ))
        })?;
        let table = value.get(REGISTRY_GROUP).and_then(|v| v.as_table());
        let string_key = |key: &str| -> Result<Option<String>> {
            match table.and_then(|t| t.get(key)) {
                None => Ok(None),
                Some(toml::Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(Error::InvalidArgument(format!(
                    "{}.{} must be a string, found {}",
                    REGISTRY_GROUP,
                    key,
                    other.type_str()
                ))),
            }
        };
        Ok(Self {
            scoperunner_path: string_key(SCOPERUNNER_PATH_KEY)?.map(PathBuf::from),
            remote_registry: string_key(REMOTE_REGISTRY_KEY)?,
        })
    }
}

#[cfg(test)]
#[path = "scope_config_tests.rs"]
mod tests;
