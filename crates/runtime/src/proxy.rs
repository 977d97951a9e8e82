// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-agnostic typed stubs.
//!
//! A proxy is an endpoint plus an identity, sharing the runtime's
//! middleware for request/response traffic. `create_query` additionally
//! binds a per-query reply endpoint and registers a reply servant there.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use scopes_core::{
    unique_id, CannedQuery, Error, FinishedReason, Result, ScopeMetadata, SearchReceiver,
};
use scopes_wire::{
    read_frame, write_frame, Endpoint, ProtocolError, ReplyMessage, Request, Response,
    WireListener,
};
use tracing::debug;

use crate::reply_object::ReplyObject;
use crate::runtime::RuntimeCore;

/// Bound on one request/response exchange.
pub(crate) const IPC_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Synchronous request/response transport seam. The caller supplies an
/// explicit reply endpoint for streaming results.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn invoke(&self, endpoint: &Endpoint, request: Request) -> Result<Response>;
}

/// Socket middleware: one connection per request, length-prefixed JSON.
pub struct SocketMiddleware {
    timeout: std::time::Duration,
}

impl SocketMiddleware {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Middleware for SocketMiddleware {
    async fn invoke(&self, endpoint: &Endpoint, request: Request) -> Result<Response> {
        let mut stream = endpoint.connect().await?;
        write_frame(&mut stream, &request, self.timeout).await.map_err(middleware_error)?;
        let response: Response =
            read_frame(&mut stream, self.timeout).await.map_err(middleware_error)?;
        response.into_result()
    }
}

pub(crate) fn middleware_error(e: ProtocolError) -> Error {
    match e {
        ProtocolError::Timeout => Error::Timeout("peer did not answer in time".into()),
        other => Error::MiddlewareError(other.to_string()),
    }
}

/// Client stub for one scope.
#[derive(Clone)]
pub struct ScopeProxy {
    core: Arc<RuntimeCore>,
    scope_id: String,
    endpoint: Endpoint,
}

impl std::fmt::Debug for ScopeProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeProxy")
            .field("scope_id", &self.scope_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ScopeProxy {
    pub(crate) fn new(core: Arc<RuntimeCore>, scope_id: String, endpoint: Endpoint) -> Self {
        Self { core, scope_id, endpoint }
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Start a query on this scope.
    ///
    /// Binds a fresh reply endpoint, registers a reply servant that
    /// demultiplexes pushes into `receiver`, then asks the scope to run
    /// the query. On failure the receiver sees exactly one
    /// `finished(Error, ..)` and the error is also returned.
    pub async fn create_query(
        &self,
        query: CannedQuery,
        receiver: Arc<dyn SearchReceiver>,
    ) -> Result<QueryCtrlProxy> {
        let reply_id = unique_id("rpl-");
        let socket_path = self.core.endpoints_dir().join(format!("{}.sock", reply_id));
        let reply_endpoint = Endpoint::Unix(socket_path.clone());
        let listener = reply_endpoint.bind().await?;
        let reply = ReplyObject::new(receiver, self.core.reaper())?;

        let demux = tokio::spawn(serve_reply(
            listener,
            Arc::clone(&reply),
            reply_id.clone(),
            socket_path.clone(),
        ));

        let request = Request::CreateQuery {
            query,
            reply_endpoint: reply_endpoint.to_string(),
            reply_id,
        };
        match self.core.middleware().invoke(&self.endpoint, request).await {
            Ok(Response::QueryCreated { query_id }) => Ok(QueryCtrlProxy {
                core: Arc::clone(&self.core),
                endpoint: self.endpoint.clone(),
                query_id,
            }),
            Ok(other) => {
                demux.abort();
                let _ = std::fs::remove_file(&socket_path);
                let err = Error::MiddlewareError(format!("unexpected response {:?}", other));
                reply.finished(FinishedReason::Error, err.message());
                Err(err)
            }
            Err(err) => {
                demux.abort();
                let _ = std::fs::remove_file(&socket_path);
                reply.finished(FinishedReason::Error, err.message());
                Err(err)
            }
        }
    }
}

/// Demultiplexer for one reply stream: accepts the scope's connection,
/// verifies the handshake, and feeds the servant until the terminal
/// message or disconnect.
async fn serve_reply(
    listener: WireListener,
    reply: Arc<ReplyObject>,
    reply_id: String,
    socket_path: PathBuf,
) {
    let mut stream = match listener.accept().await {
        Ok(stream) => stream,
        Err(e) => {
            reply.finished(FinishedReason::Error, e.message());
            let _ = std::fs::remove_file(&socket_path);
            return;
        }
    };

    match read_reply(&mut stream).await {
        Ok(ReplyMessage::Hello { reply_id: got }) if got == reply_id => {}
        _ => {
            reply.finished(FinishedReason::Error, "reply handshake failed");
            let _ = std::fs::remove_file(&socket_path);
            return;
        }
    }

    loop {
        match read_reply(&mut stream).await {
            Ok(ReplyMessage::Push { payload }) => {
                if !reply.push(payload) {
                    // The reply is finished (cancel, error, or reaped);
                    // drop the connection so the scope side sees a dead
                    // stream and stops pushing.
                    break;
                }
            }
            Ok(ReplyMessage::Finished { reason, message }) => {
                reply.finished(reason, &message);
                break;
            }
            Ok(ReplyMessage::Hello { .. }) => {
                reply.finished(FinishedReason::Error, "unexpected reply handshake");
                break;
            }
            Err(ProtocolError::ConnectionClosed) => {
                reply.finished(FinishedReason::Error, "scope closed reply stream early");
                break;
            }
            Err(e) => {
                reply.finished(FinishedReason::Error, &e.to_string());
                break;
            }
        }
    }
    let _ = std::fs::remove_file(&socket_path);
}

async fn read_reply(
    stream: &mut scopes_wire::WireStream,
) -> std::result::Result<ReplyMessage, ProtocolError> {
    let payload = scopes_wire::read_message(stream).await?;
    scopes_wire::decode(&payload)
}

/// Control stub for one running query.
#[derive(Clone)]
pub struct QueryCtrlProxy {
    core: Arc<RuntimeCore>,
    endpoint: Endpoint,
    query_id: String,
}

impl std::fmt::Debug for QueryCtrlProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCtrlProxy")
            .field("query_id", &self.query_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl QueryCtrlProxy {
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Cancel the query. Idempotent; cancelling an already-finished query
    /// succeeds.
    pub async fn cancel(&self) -> Result<()> {
        let request = Request::CancelQuery { query_id: self.query_id.clone() };
        match self.core.middleware().invoke(&self.endpoint, request).await? {
            Response::Ok => Ok(()),
            other => Err(Error::MiddlewareError(format!("unexpected response {:?}", other))),
        }
    }

    /// Drop all scope-side state for this query.
    pub async fn destroy(&self) -> Result<()> {
        let request = Request::DestroyQuery { query_id: self.query_id.clone() };
        match self.core.middleware().invoke(&self.endpoint, request).await? {
            Response::Ok => Ok(()),
            other => Err(Error::MiddlewareError(format!("unexpected response {:?}", other))),
        }
    }
}

/// Client stub for the registry.
#[derive(Clone)]
pub struct RegistryProxy {
    core: Arc<RuntimeCore>,
    endpoint: Endpoint,
}

impl RegistryProxy {
    pub(crate) fn new(core: Arc<RuntimeCore>, endpoint: Endpoint) -> Self {
        Self { core, endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Metadata for one scope.
    pub async fn get_metadata(&self, scope_id: &str) -> Result<ScopeMetadata> {
        let request = Request::GetMetadata { scope_id: scope_id.to_string() };
        match self.core.middleware().invoke(&self.endpoint, request).await? {
            Response::Metadata { metadata } => Ok(metadata),
            other => Err(Error::MiddlewareError(format!("unexpected response {:?}", other))),
        }
    }

    /// All known scopes as metadata.
    pub async fn list_metadata(&self) -> Result<BTreeMap<String, ScopeMetadata>> {
        match self.core.middleware().invoke(&self.endpoint, Request::ListScopes).await? {
            Response::ScopeList { scopes } => {
                Ok(scopes.into_iter().map(|m| (m.scope_id.clone(), m)).collect())
            }
            other => Err(Error::MiddlewareError(format!("unexpected response {:?}", other))),
        }
    }

    /// All known scopes as ready-to-use proxies.
    pub async fn list(&self) -> Result<BTreeMap<String, ScopeProxy>> {
        let mut proxies = BTreeMap::new();
        for (scope_id, metadata) in self.list_metadata().await? {
            proxies.insert(scope_id, self.proxy_for(&metadata)?);
        }
        Ok(proxies)
    }

    /// Proxy for a scope without touching its worker process.
    pub async fn find(&self, scope_id: &str) -> Result<ScopeProxy> {
        let metadata = self.get_metadata(scope_id).await?;
        self.proxy_for(&metadata)
    }

    /// Proxy for a scope, ensuring its worker process is running.
    pub async fn locate(&self, scope_id: &str) -> Result<ScopeProxy> {
        let request = Request::Locate { scope_id: scope_id.to_string() };
        match self.core.middleware().invoke(&self.endpoint, request).await? {
            Response::Metadata { metadata } => self.proxy_for(&metadata),
            other => Err(Error::MiddlewareError(format!("unexpected response {:?}", other))),
        }
    }

    fn proxy_for(&self, metadata: &ScopeMetadata) -> Result<ScopeProxy> {
        let endpoint = Endpoint::parse(&metadata.endpoint)?;
        debug!(scope_id = %metadata.scope_id, %endpoint, "scope proxy created");
        Ok(ScopeProxy::new(
            Arc::clone(&self.core),
            metadata.scope_id.clone(),
            endpoint,
        ))
    }
}
