// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide runtime facade.
//!
//! Owns the transport middleware, one reaper, and the registry proxy
//! factory. There is no implicit global; every client and every scope
//! process constructs its own `Runtime` and tears it down (explicitly or
//! on drop).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scopes_core::{Error, Result, ScopeMetadata};
use scopes_wire::Endpoint;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::proxy::{Middleware, RegistryProxy, ScopeProxy, SocketMiddleware, IPC_TIMEOUT};
use crate::reaper::{DestroyPolicy, Reaper};
use crate::scope::ScopeBase;
use crate::server::serve_scope;

pub(crate) struct RuntimeCore {
    identity: String,
    config: RuntimeConfig,
    middleware: Arc<dyn Middleware>,
    reaper: Option<Arc<Reaper>>,
    endpoints_dir: PathBuf,
    shutdown: CancellationToken,
}

impl RuntimeCore {
    pub(crate) fn middleware(&self) -> &Arc<dyn Middleware> {
        &self.middleware
    }

    pub(crate) fn reaper(&self) -> Option<&Arc<Reaper>> {
        self.reaper.as_ref()
    }

    pub(crate) fn endpoints_dir(&self) -> &Path {
        &self.endpoints_dir
    }

    pub(crate) fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}

pub struct Runtime {
    core: Arc<RuntimeCore>,
}

impl Runtime {
    /// Initialise a runtime for the given identity from a config file
    /// (or all defaults when no file is given).
    pub fn create(identity: &str, configfile: Option<&Path>) -> Result<Runtime> {
        let config = RuntimeConfig::load(configfile)?;
        Self::create_with_config(identity, config)
    }

    /// Initialise from an already-loaded configuration.
    pub fn create_with_config(identity: &str, config: RuntimeConfig) -> Result<Runtime> {
        if identity.is_empty() {
            return Err(Error::InvalidArgument("runtime identity must not be empty".into()));
        }

        let endpoints_dir = config.endpoints_dir();
        std::fs::create_dir_all(&endpoints_dir).map_err(|e| {
            Error::ResourceError(format!(
                "cannot create endpoint directory {:?}: {}",
                endpoints_dir.display(),
                e
            ))
        })?;

        let reaper = match config.reaper_intervals() {
            Some((reap, expiry)) => {
                Some(Reaper::create(reap, expiry, DestroyPolicy::NoCallbackOnDestroy)?)
            }
            None => None,
        };

        info!(identity, "runtime created");
        Ok(Runtime {
            core: Arc::new(RuntimeCore {
                identity: identity.to_string(),
                config,
                middleware: Arc::new(SocketMiddleware::new(IPC_TIMEOUT)),
                reaper,
                endpoints_dir,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn identity(&self) -> &str {
        &self.core.identity
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.core.config
    }

    /// The reaper shared by this runtime's reply servants, when reaping
    /// is enabled.
    pub fn reaper(&self) -> Option<&Arc<Reaper>> {
        self.core.reaper.as_ref()
    }

    /// Proxy for the configured registry.
    pub fn registry_proxy(&self) -> RegistryProxy {
        RegistryProxy::new(Arc::clone(&self.core), self.core.config.registry_endpoint())
    }

    /// Proxy for a registry at an explicit endpoint (e.g. a remote one).
    pub fn registry_proxy_at(&self, endpoint: Endpoint) -> RegistryProxy {
        RegistryProxy::new(Arc::clone(&self.core), endpoint)
    }

    /// Proxy for a scope from its metadata, without going through the
    /// registry.
    pub fn scope_proxy(&self, metadata: &ScopeMetadata) -> Result<ScopeProxy> {
        let endpoint = Endpoint::parse(&metadata.endpoint)?;
        Ok(ScopeProxy::new(
            Arc::clone(&self.core),
            metadata.scope_id.clone(),
            endpoint,
        ))
    }

    /// Proxy for a scope served at an explicit endpoint.
    pub fn scope_proxy_at(&self, scope_id: &str, endpoint: Endpoint) -> ScopeProxy {
        ScopeProxy::new(Arc::clone(&self.core), scope_id.to_string(), endpoint)
    }

    /// Host a scope implementation: bind its endpoint, report readiness to
    /// the registry, and serve queries until [`destroy`](Self::destroy).
    pub async fn run_scope(&self, scope_id: &str, scope: Arc<dyn ScopeBase>) -> Result<()> {
        serve_scope(Arc::clone(&self.core), scope_id.to_string(), scope).await
    }

    /// Tear down in reverse order of construction. Idempotent; implicitly
    /// called on drop.
    pub fn destroy(&self) {
        self.core.shutdown.cancel();
        if let Some(reaper) = &self.core.reaper {
            reaper.shutdown();
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
