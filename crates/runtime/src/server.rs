// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope-side server: accepts query requests on the scope's endpoint and
//! runs one query object per request.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use scopes_core::{unique_id, CannedQuery, Error, Result};
use scopes_wire::{read_frame, write_frame, Endpoint, Request, Response, WireStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::proxy::IPC_TIMEOUT;
use crate::query_object::QueryObject;
use crate::runtime::RuntimeCore;
use crate::scope::{ScopeBase, SearchContext};
use crate::search_reply::{reply_writer, ReplyConn, ReplyImpl, SearchReply};

type QueryTable = Arc<Mutex<HashMap<String, Arc<QueryObject>>>>;

/// Serve a scope until the runtime shuts down.
pub(crate) async fn serve_scope(
    core: Arc<RuntimeCore>,
    scope_id: String,
    scope: Arc<dyn ScopeBase>,
) -> Result<()> {
    scope.start(&scope_id)?;

    let endpoint = core.config().endpoint_for(&scope_id);
    if let Endpoint::Unix(path) = &endpoint {
        // A stale socket from a previous run blocks the bind.
        let _ = std::fs::remove_file(path);
    }
    let listener = endpoint.bind().await?;
    info!(scope_id, %endpoint, "scope serving");

    // Tell the registry we are ready. Outside a registry-spawned process
    // (tests, manual runs) there is nobody listening; that is fine.
    let ready = Request::Ready { scope_id: scope_id.clone() };
    if let Err(e) =
        core.middleware().invoke(&core.config().registry_endpoint(), ready).await
    {
        debug!(scope_id, "registry not notified: {}", e);
    }

    let queries: QueryTable = Arc::new(Mutex::new(HashMap::new()));
    loop {
        tokio::select! {
            _ = core.shutdown_token().cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok(stream) => {
                        let scope = Arc::clone(&scope);
                        let queries = Arc::clone(&queries);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(scope, queries, stream).await {
                                debug!("scope connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => warn!("scope accept error: {}", e),
                }
            }
        }
    }

    scope.stop();
    if let Endpoint::Unix(path) = &endpoint {
        let _ = std::fs::remove_file(path);
    }
    info!(scope_id, "scope stopped");
    Ok(())
}

async fn handle_connection(
    scope: Arc<dyn ScopeBase>,
    queries: QueryTable,
    mut stream: WireStream,
) -> Result<()> {
    let request: Request = read_frame(&mut stream, IPC_TIMEOUT)
        .await
        .map_err(crate::proxy::middleware_error)?;

    let response = match request {
        Request::Ping => Response::Pong,

        Request::CreateQuery { query, reply_endpoint, reply_id } => {
            match start_query(&scope, &queries, query, &reply_endpoint, reply_id).await {
                Ok(query_id) => Response::QueryCreated { query_id },
                Err(e) => Response::error(&e),
            }
        }

        Request::CancelQuery { query_id } => {
            // Unknown ids are fine: the query may already have been
            // destroyed, and cancel is idempotent.
            let query = queries.lock().get(&query_id).cloned();
            if let Some(query) = query {
                query.cancel().await;
            }
            Response::Ok
        }

        Request::DestroyQuery { query_id } => {
            queries.lock().remove(&query_id);
            Response::Ok
        }

        other => {
            debug!(request = ?other, "request not supported by scope endpoint");
            Response::error(&Error::LogicError("not supported by scope endpoint".into()))
        }
    };

    write_frame(&mut stream, &response, IPC_TIMEOUT)
        .await
        .map_err(crate::proxy::middleware_error)
}

/// Spawn the reply writer, build the query object, and run the user's
/// search on a blocking worker.
async fn start_query(
    scope: &Arc<dyn ScopeBase>,
    queries: &QueryTable,
    query: CannedQuery,
    reply_endpoint: &str,
    reply_id: String,
) -> Result<String> {
    let reply_endpoint = Endpoint::parse(reply_endpoint)?;

    let search = match catch_unwind(AssertUnwindSafe(|| scope.search(&query))) {
        Ok(result) => result?,
        Err(_) => {
            return Err(Error::ResourceError("scope search factory panicked".into()));
        }
    };

    let query_object = QueryObject::new(search);
    let query_id = unique_id("qry-");

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(reply_writer(reply_endpoint, reply_id, rx));

    let reply_impl = ReplyImpl::new(ReplyConn::new(tx), Arc::clone(&query_object));
    query_object.set_reply(Arc::downgrade(&reply_impl));
    queries.lock().insert(query_id.clone(), Arc::clone(&query_object));

    let ctx = SearchContext::new(
        tokio::runtime::Handle::current(),
        Arc::downgrade(&query_object),
    );
    let reply = SearchReply::new(reply_impl);
    let queries = Arc::clone(queries);
    let table_id = query_id.clone();
    tokio::task::spawn_blocking(move || {
        query_object.run(ctx, reply);
        // The run is over; drop the control entry so the table does not
        // grow without bound. Cancel on a finished query stays a no-op.
        queries.lock().remove(&table_id);
    });

    Ok(query_id)
}
