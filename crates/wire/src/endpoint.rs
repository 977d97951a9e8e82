// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport endpoint strings: `unix://PATH` and `tcp://HOST:PORT`.
//!
//! Endpoints are validated when parsed and again when bound or connected.

use std::fmt;
use std::path::PathBuf;

use scopes_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};

/// A validated transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Parse and validate a `PROTOCOL://AUTHORITY` endpoint string.
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(Error::InvalidArgument(format!("endpoint without path: {:?}", s)));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if let Some(authority) = s.strip_prefix("tcp://") {
            let (host, port) = authority.rsplit_once(':').ok_or_else(|| {
                Error::InvalidArgument(format!("tcp endpoint without port: {:?}", s))
            })?;
            if host.is_empty() {
                return Err(Error::InvalidArgument(format!("tcp endpoint without host: {:?}", s)));
            }
            let port: u16 = port.parse().map_err(|_| {
                Error::InvalidArgument(format!("invalid port in endpoint: {:?}", s))
            })?;
            return Ok(Endpoint::Tcp { host: host.to_string(), port });
        }
        Err(Error::InvalidArgument(format!("unsupported endpoint protocol: {:?}", s)))
    }

    /// Bind a listener at this endpoint.
    pub async fn bind(&self) -> Result<WireListener> {
        match self {
            Endpoint::Unix(path) => {
                let listener = UnixListener::bind(path).map_err(|e| {
                    Error::MiddlewareError(format!("bind {:?}: {}", path.display(), e))
                })?;
                Ok(WireListener::Unix(listener))
            }
            Endpoint::Tcp { host, port } => {
                let listener = TcpListener::bind((host.as_str(), *port)).await.map_err(|e| {
                    Error::MiddlewareError(format!("bind {}:{}: {}", host, port, e))
                })?;
                Ok(WireListener::Tcp(listener))
            }
        }
    }

    /// Open a connection to this endpoint.
    pub async fn connect(&self) -> Result<WireStream> {
        match self {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path).await.map_err(|e| {
                    Error::MiddlewareError(format!("connect {:?}: {}", path.display(), e))
                })?;
                Ok(WireStream::new(stream))
            }
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).await.map_err(|e| {
                    Error::MiddlewareError(format!("connect {}:{}: {}", host, port, e))
                })?;
                Ok(WireStream::new(stream))
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// A connected byte stream, transport-erased.
pub struct WireStream {
    inner: Box<dyn Transport>,
}

impl WireStream {
    fn new<T: AsyncRead + AsyncWrite + Unpin + Send + 'static>(stream: T) -> Self {
        Self { inner: Box::new(stream) }
    }
}

impl AsyncRead for WireStream {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut *self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for WireStream {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        std::pin::Pin::new(&mut *self.inner).poll_write(cx, buf)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut *self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut *self.inner).poll_shutdown(cx)
    }
}

/// A bound listener at either transport.
pub enum WireListener {
    Unix(UnixListener),
    Tcp(TcpListener),
}

impl WireListener {
    /// Accept one connection.
    pub async fn accept(&self) -> Result<WireStream> {
        match self {
            WireListener::Unix(listener) => {
                let (stream, _) = listener
                    .accept()
                    .await
                    .map_err(|e| Error::MiddlewareError(format!("accept: {}", e)))?;
                Ok(WireStream::new(stream))
            }
            WireListener::Tcp(listener) => {
                let (stream, _) = listener
                    .accept()
                    .await
                    .map_err(|e| Error::MiddlewareError(format!("accept: {}", e)))?;
                Ok(WireStream::new(stream))
            }
        }
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
