// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authoritative in-memory catalog of installed scopes plus the
//! lifecycle controller for their worker processes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use scopes_core::{Error, Result, ScopeMetadata};
use scopes_runtime::RegistryProxy;
use tracing::{info, warn};

use crate::process::ScopeProcess;

struct Inner {
    scopes: BTreeMap<String, ScopeMetadata>,
    processes: BTreeMap<String, Arc<ScopeProcess>>,
    shutting_down: bool,
}

/// One mutex guards both maps; `locate` drops it before any wait on a
/// child process.
pub struct RegistryObject {
    inner: Mutex<Inner>,
    remote: Option<RegistryProxy>,
}

impl RegistryObject {
    pub fn new(remote: Option<RegistryProxy>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                scopes: BTreeMap::new(),
                processes: BTreeMap::new(),
                shutting_down: false,
            }),
            remote,
        }
    }

    /// Metadata for one scope. Local entries win; a configured remote
    /// registry is consulted for the rest.
    pub async fn get_metadata(&self, scope_id: &str) -> Result<ScopeMetadata> {
        if scope_id.is_empty() {
            return Err(Error::InvalidArgument("cannot search for scope with empty id".into()));
        }
        if let Some(metadata) = self.inner.lock().scopes.get(scope_id).cloned() {
            return Ok(metadata);
        }
        if let Some(remote) = &self.remote {
            return remote.get_metadata(scope_id).await;
        }
        Err(Error::NotFound(format!("no such scope: {}", scope_id)))
    }

    /// Union of local and remote scopes; local wins on id collision.
    pub async fn list(&self) -> Result<BTreeMap<String, ScopeMetadata>> {
        let mut all = match &self.remote {
            Some(remote) => match remote.list_metadata().await {
                Ok(remote_scopes) => remote_scopes,
                Err(e) => {
                    warn!("remote registry list failed: {}", e);
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        for (id, metadata) in self.inner.lock().scopes.iter() {
            all.insert(id.clone(), metadata.clone());
        }
        Ok(all)
    }

    /// Metadata for one scope with its worker process guaranteed to be in
    /// state `Running`.
    ///
    /// `Stopping` workers are waited for (bounded by the stop grace) and
    /// re-spawned; spawn failure and ready timeout surface as
    /// `ResourceError`. Only local scopes can be located.
    pub async fn locate(&self, scope_id: &str) -> Result<ScopeMetadata> {
        let (metadata, process) = {
            let inner = self.inner.lock();
            if scope_id.is_empty() {
                return Err(Error::InvalidArgument("cannot locate scope with empty id".into()));
            }
            if inner.shutting_down {
                return Err(Error::LogicError("registry is shutting down".into()));
            }
            let metadata = inner
                .scopes
                .get(scope_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("no such scope: {}", scope_id)))?;
            let process = inner
                .processes
                .get(scope_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("no such scope: {}", scope_id)))?;
            (metadata, process)
        };

        process.ensure_running().await?;
        Ok(metadata)
    }

    /// Insert a scope, replacing any existing entry with the same id.
    /// Returns false when an entry was replaced.
    pub fn add_local_scope(
        &self,
        metadata: ScopeMetadata,
        exec_argv: Vec<String>,
    ) -> Result<bool> {
        metadata.validate()?;
        let scope_id = metadata.scope_id.clone();
        let process = ScopeProcess::new(scope_id.clone(), exec_argv);

        let mut inner = self.inner.lock();
        let replaced = inner.scopes.remove(&scope_id).is_some();
        inner.processes.remove(&scope_id);
        inner.scopes.insert(scope_id.clone(), metadata);
        inner.processes.insert(scope_id.clone(), process);
        if replaced {
            info!(scope_id, "scope replaced in registry");
        } else {
            info!(scope_id, "scope added to registry");
        }
        Ok(!replaced)
    }

    /// Remove a scope and its process record; reports whether an entry
    /// existed.
    pub fn remove_local_scope(&self, scope_id: &str) -> Result<bool> {
        if scope_id.is_empty() {
            return Err(Error::InvalidArgument("cannot remove scope with empty id".into()));
        }
        let mut inner = self.inner.lock();
        inner.processes.remove(scope_id);
        Ok(inner.scopes.remove(scope_id).is_some())
    }

    /// Readiness signal from a spawned worker.
    pub fn mark_ready(&self, scope_id: &str) {
        let process = self.inner.lock().processes.get(scope_id).cloned();
        match process {
            Some(process) => process.mark_ready(),
            None => warn!(scope_id, "ready signal from unknown scope"),
        }
    }

    /// Process state snapshot, mainly for diagnostics and tests.
    pub fn process(&self, scope_id: &str) -> Option<Arc<ScopeProcess>> {
        self.inner.lock().processes.get(scope_id).cloned()
    }

    /// Stop accepting `locate` calls and terminate every worker: SIGTERM,
    /// bounded grace, SIGKILL for survivors.
    pub async fn shutdown(&self) {
        let processes: Vec<Arc<ScopeProcess>> = {
            let mut inner = self.inner.lock();
            if inner.shutting_down {
                return;
            }
            inner.shutting_down = true;
            inner.processes.values().cloned().collect()
        };
        for process in processes {
            process.stop().await;
        }
        info!("registry shut down");
    }
}

#[cfg(test)]
#[path = "registry_object_tests.rs"]
mod tests;
