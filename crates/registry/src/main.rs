// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scopereg`: the registry daemon.
//!
//! Usage: `scopereg [runtime-configfile]`. Scans the configured scope
//! directory, serves the registry endpoint, and terminates workers on
//! SIGINT/SIGTERM.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scopes_core::{Error, Result};
use scopes_registry::bootstrap::populate_registry;
use scopes_registry::listener::{serve, ListenCtx};
use scopes_registry::{RegistryConfig, RegistryObject};
use scopes_runtime::{init_logging, Runtime, RuntimeConfig};
use scopes_wire::Endpoint;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    let configfile = std::env::args().nth(1).map(PathBuf::from);
    if let Err(e) = run(configfile.as_deref()).await {
        eprintln!("scopereg: {}", e);
        std::process::exit(1);
    }
}

async fn run(configfile: Option<&Path>) -> Result<()> {
    let config = RuntimeConfig::load(configfile)?;
    let _log_guard = init_logging(&config.log_dir, "scopereg", config.max_log_dir_size)?;

    let registry_config = RegistryConfig::load(config.registry_configfile.as_deref())?;

    // A runtime instance only exists to mint the remote-registry proxy;
    // the proxy keeps the transport alive on its own.
    let remote = match &registry_config.remote_registry {
        Some(remote_endpoint) => {
            let runtime = Runtime::create_with_config(&config.registry_identity, config.clone())?;
            let endpoint = Endpoint::parse(remote_endpoint)?;
            Some(runtime.registry_proxy_at(endpoint))
        }
        None => None,
    };

    let registry = Arc::new(RegistryObject::new(remote));
    let scopes_dir = config.config_dir.join("scopes");
    let registered =
        populate_registry(&registry, &config, &registry_config, configfile, &scopes_dir)?;
    info!(registered, scopes_dir = %scopes_dir.display(), "registry populated");

    let endpoint = config.registry_endpoint();
    std::fs::create_dir_all(config.endpoints_dir()).map_err(|e| {
        Error::ResourceError(format!("cannot create endpoint directory: {}", e))
    })?;
    if let Endpoint::Unix(path) = &endpoint {
        let _ = std::fs::remove_file(path);
    }
    let listener = endpoint.bind().await?;
    info!(%endpoint, "registry listening");

    let ctx = Arc::new(ListenCtx {
        registry: Arc::clone(&registry),
        shutdown: CancellationToken::new(),
    });

    let serve_task = tokio::spawn(serve(listener, Arc::clone(&ctx)));
    tokio::select! {
        _ = ctx.shutdown.cancelled() => {}
        _ = wait_for_signal() => ctx.shutdown.cancel(),
    }
    let _ = serve_task.await;

    registry.shutdown().await;
    if let Endpoint::Unix(path) = &endpoint {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::error!("cannot install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupt received"),
        _ = term.recv() => info!("termination requested"),
    }
}
