//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Parse the backend URL (scheme http, default port 80, base path)
//! - Dial, write the serialized request, read the framed response
//! - Enforce one deadline across dial + write + read
//! - Classify failures for the gateway's status translation
//!
//! # Design Decisions
//! - A fresh connection per forward; no pooling
//! - The socket is owned by the call and dropped on every exit path,
//!   including when the deadline fires mid-read

use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use url::Url;

use crate::http::{HttpError, HttpRequest, HttpResponse};

/// Failure classification for a forward attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// DNS, connect, write or read failed; also a malformed backend URL.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The overall deadline elapsed before a complete response arrived.
    #[error("upstream timed out")]
    Timeout,

    /// The upstream sent bytes that do not parse as an HTTP/1.1 response.
    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

/// Host, port and base path extracted from a backend URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BackendAddr {
    host: String,
    port: u16,
    base_path: String,
}

impl BackendAddr {
    fn parse(backend_url: &str) -> Result<Self, ForwardError> {
        let url = Url::parse(backend_url).map_err(|e| {
            ForwardError::Unreachable(format!("invalid backend URL {backend_url:?}: {e}"))
        })?;
        if url.scheme() != "http" {
            return Err(ForwardError::Unreachable(format!(
                "unsupported scheme {:?} in backend URL {backend_url:?}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| {
                ForwardError::Unreachable(format!("backend URL {backend_url:?} has no host"))
            })?
            .to_string();
        let port = url.port().unwrap_or(80);
        // "/" means no base path; anything longer is prepended to the
        // incoming request path.
        let base_path = match url.path() {
            "/" => String::new(),
            path => path.to_string(),
        };
        Ok(Self {
            host,
            port,
            base_path,
        })
    }
}

/// Stateless forwarding client. One connection per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpstreamClient;

impl UpstreamClient {
    pub fn new() -> Self {
        Self
    }

    /// Forward `request` to `backend_url`, bounded by `timeout`.
    ///
    /// The effective request path is the URL's base path followed by the
    /// incoming path. A response arriving after the deadline is discarded
    /// along with the socket.
    pub async fn forward(
        &self,
        request: &HttpRequest,
        backend_url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, ForwardError> {
        let addr = BackendAddr::parse(backend_url)?;
        match tokio::time::timeout(timeout, exchange(request, &addr)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout),
        }
    }
}

async fn exchange(
    request: &HttpRequest,
    addr: &BackendAddr,
) -> Result<HttpResponse, ForwardError> {
    let mut outbound = request.clone();
    outbound.path = format!("{}{}", addr.base_path, request.path);

    let mut stream = TcpStream::connect((addr.host.as_str(), addr.port))
        .await
        .map_err(|e| {
            ForwardError::Unreachable(format!("connect {}:{} failed: {e}", addr.host, addr.port))
        })?;

    stream
        .write_all(&outbound.to_bytes())
        .await
        .map_err(|e| ForwardError::Unreachable(format!("write failed: {e}")))?;

    match HttpResponse::read_from(&mut stream).await {
        Ok(response) => Ok(response),
        Err(HttpError::Io(e)) => Err(ForwardError::Unreachable(format!("read failed: {e}"))),
        Err(e) => Err(ForwardError::Protocol(e.to_string())),
    }
}
