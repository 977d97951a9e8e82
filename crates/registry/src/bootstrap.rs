// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-scan bootstrap: read the scope description files and
//! populate the registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scopes_core::Result;
use scopes_runtime::RuntimeConfig;
use tracing::{info, warn};

use crate::registry_object::RegistryObject;
use crate::scope_config::{RegistryConfig, ScopeConfig};

/// Scope description files directly inside `dir` (non-recursive), sorted
/// for a stable registration order. A missing directory is simply empty.
pub fn find_scope_configs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| {
        scopes_core::Error::ResourceError(format!(
            "cannot scan scope directory {:?}: {}",
            dir.display(),
            e
        ))
    })?;
    let mut configs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    configs.sort();
    Ok(configs)
}

/// Load every scope config and register it. Malformed files are logged
/// and skipped. Returns the number of scopes registered.
pub fn populate_registry(
    registry: &Arc<RegistryObject>,
    runtime_config: &RuntimeConfig,
    registry_config: &RegistryConfig,
    runtime_configfile: Option<&Path>,
    scopes_dir: &Path,
) -> Result<usize> {
    let mut registered = 0;
    for path in find_scope_configs(scopes_dir)? {
        let config = match ScopeConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), "skipping scope config: {}", e);
                continue;
            }
        };

        let scope_id = config.scope_id.clone();
        let endpoint = runtime_config.endpoint_for(&scope_id).to_string();
        let exec_argv = exec_argv_for(registry_config, runtime_configfile, &path);
        let metadata = config.into_metadata(endpoint);
        match registry.add_local_scope(metadata, exec_argv) {
            Ok(_) => {
                registered += 1;
                info!(scope_id, "scope registered");
            }
            Err(e) => warn!(scope_id, "skipping scope: {}", e),
        }
    }
    Ok(registered)
}

/// The child-process spawn contract:
/// `[scoperunner_path, runtime_configfile, scope_configfile]`.
/// Without a configured scoperunner the scope gets no exec data and
/// `locate` reports the failure.
fn exec_argv_for(
    registry_config: &RegistryConfig,
    runtime_configfile: Option<&Path>,
    scope_configfile: &Path,
) -> Vec<String> {
    let Some(scoperunner) = &registry_config.scoperunner_path else {
        return Vec::new();
    };
    vec![
        scoperunner.display().to_string(),
        runtime_configfile.map(|p| p.display().to_string()).unwrap_or_default(),
        scope_configfile.display().to_string(),
    ]
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
