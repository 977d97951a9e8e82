// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the registry endpoint.
//!
//! Accepts connections and handles them without blocking registry state;
//! each connection is one request/response exchange.

use std::sync::Arc;
use std::time::Duration;

use scopes_core::Error;
use scopes_wire::{read_frame, write_frame, ProtocolError, Request, Response, WireListener, WireStream};
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry_object::RegistryObject;

const IPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared context for all request handlers.
pub struct ListenCtx {
    pub registry: Arc<RegistryObject>,
    pub shutdown: CancellationToken,
}

#[derive(Debug, ThisError)]
enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Run the accept loop until shutdown, spawning a task per connection.
pub async fn serve(listener: WireListener, ctx: Arc<ListenCtx>) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok(stream) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("registry accept error: {}", e),
                }
            }
        }
    }
    info!("registry listener stopped");
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("client disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("connection timeout"),
        _ => error!("connection error: {}", e),
    }
}

async fn handle_connection(
    mut stream: WireStream,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError> {
    let request: Request = read_frame(&mut stream, IPC_TIMEOUT).await?;

    // Ready signals arrive on every spawn; keep them at debug level.
    if matches!(request, Request::Ready { .. } | Request::Ping) {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    write_frame(&mut stream, &response, IPC_TIMEOUT).await?;
    Ok(())
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::GetMetadata { scope_id } => {
            match ctx.registry.get_metadata(&scope_id).await {
                Ok(metadata) => Response::Metadata { metadata },
                Err(e) => Response::error(&e),
            }
        }

        Request::ListScopes => match ctx.registry.list().await {
            Ok(scopes) => {
                Response::ScopeList { scopes: scopes.into_values().collect() }
            }
            Err(e) => Response::error(&e),
        },

        Request::Locate { scope_id } => match ctx.registry.locate(&scope_id).await {
            Ok(metadata) => Response::Metadata { metadata },
            Err(e) => Response::error(&e),
        },

        Request::Ready { scope_id } => {
            ctx.registry.mark_ready(&scope_id);
            Response::Ok
        }

        Request::Shutdown => {
            ctx.shutdown.cancel();
            Response::ShuttingDown
        }

        other => {
            debug!(request = ?other, "request not supported by registry endpoint");
            Response::error(&Error::LogicError(
                "not supported by registry endpoint".into(),
            ))
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
