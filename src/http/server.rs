//! HTTP server: accept loop and per-connection request handling.
//!
//! # Responsibilities
//! - Bind the listener with SO_REUSEADDR
//! - Accept connections concurrently, bounded by a semaphore
//! - Read one request per connection, dispatch to the handler, reply, close
//! - Keep accepting after transient accept errors
//!
//! # Design Decisions
//! - One spawned task per connection; the connection permit is held for the
//!   task's lifetime so backpressure survives panics
//! - `stop()` closes the listener only; in-flight handlers run to completion

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::http::{HttpError, HttpRequest, HttpResponse};

/// Seam between the connection layer and the gateway orchestrator.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Produce a response for one parsed request. Infallible: error
    /// translation to HTTP statuses happens inside the handler.
    async fn handle(&self, request: HttpRequest) -> HttpResponse;

    /// Deadline for reading a request off a client connection.
    fn client_timeout(&self) -> Duration {
        Duration::from_millis(30_000)
    }
}

/// TCP server that feeds parsed requests to a [`RequestHandler`].
pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl HttpServer {
    /// Bind the listener and start the accept loop.
    pub async fn start(
        port: u16,
        max_connections: usize,
        handler: Arc<dyn RequestHandler>,
    ) -> std::io::Result<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(1024)?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let accept_task =
            tokio::spawn(accept_loop(listener, max_connections, handler, shutdown_rx));

        tracing::info!(address = %local_addr, "HTTP server started");
        Ok(Self {
            local_addr,
            shutdown,
            accept_task,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listener. In-flight connection handlers run to completion.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.accept_task.await;
        tracing::info!("HTTP server stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    max_connections: usize,
    handler: Arc<dyn RequestHandler>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let permits = Arc::new(Semaphore::new(max_connections));
    loop {
        let permit = tokio::select! {
            _ = shutdown.recv() => break,
            permit = permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        handle_connection(stream, peer, handler).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                }
            },
        }
    }
    tracing::debug!("accept loop exited");
}

/// Read one request, dispatch it, write the response, close the connection.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, handler: Arc<dyn RequestHandler>) {
    let read = tokio::time::timeout(handler.client_timeout(), HttpRequest::read_from(&mut stream));
    let mut request = match read.await {
        Ok(Ok(request)) => request,
        Ok(Err(HttpError::Io(e))) => {
            tracing::debug!(peer = %peer, error = %e, "client connection error");
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(peer = %peer, error = %e, "malformed request");
            write_response(&mut stream, &HttpResponse::internal_server_error()).await;
            return;
        }
        Err(_) => {
            tracing::warn!(peer = %peer, "timed out reading request");
            return;
        }
    };

    // Tag the request for log correlation across the forwarding path.
    if request.header("x-request-id").is_none() {
        request
            .headers
            .insert("x-request-id".to_string(), Uuid::new_v4().to_string());
    }

    let response = handler.handle(request).await;
    write_response(&mut stream, &response).await;
}

async fn write_response(stream: &mut TcpStream, response: &HttpResponse) {
    if let Err(e) = stream.write_all(&response.to_bytes()).await {
        tracing::debug!(error = %e, "failed to write response");
    }
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    struct EchoPath;

    #[async_trait]
    impl RequestHandler for EchoPath {
        async fn handle(&self, request: HttpRequest) -> HttpResponse {
            let mut response = HttpResponse::not_found();
            response.body = request.path.into_bytes();
            response
                .headers
                .insert("Content-Length".to_string(), response.body.len().to_string());
            response
        }
    }

    async fn roundtrip(port: u16, raw: &[u8]) -> Vec<u8> {
        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(raw).await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn serves_one_request_per_connection() {
        let server = HttpServer::start(28711, 16, Arc::new(EchoPath)).await.unwrap();
        let port = server.local_addr().port();

        let reply = roundtrip(port, b"GET /ping HTTP/1.1\r\nHost: t\r\n\r\n").await;
        let text = String::from_utf8(reply).unwrap();
        assert!(text.starts_with("HTTP/1.1 404"));
        assert!(text.ends_with("/ping"));

        server.stop().await;
    }

    #[tokio::test]
    async fn malformed_request_gets_a_500() {
        let server = HttpServer::start(28712, 16, Arc::new(EchoPath)).await.unwrap();
        let port = server.local_addr().port();

        let reply = roundtrip(port, b"garbage-line\r\n\r\n").await;
        let text = String::from_utf8(reply).unwrap();
        assert!(text.starts_with("HTTP/1.1 500"));

        server.stop().await;
    }

    #[tokio::test]
    async fn stop_closes_the_listener() {
        let server = HttpServer::start(28713, 16, Arc::new(EchoPath)).await.unwrap();
        let port = server.local_addr().port();
        server.stop().await;

        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }
}
