//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, per-connection task)
//!     → request.rs / codec.rs (parse request off the socket)
//!     → [gateway decides route and backend]
//!     → response.rs (serialize the reply)
//!     → Send to client
//! ```
//!
//! The same codec reads upstream responses for the forwarding client.

pub mod codec;
pub mod request;
pub mod response;
pub mod server;

pub use request::HttpRequest;
pub use response::HttpResponse;
pub use server::{HttpServer, RequestHandler};

use std::collections::BTreeMap;

use thiserror::Error;

/// Header map with case-sensitive keys and deterministic iteration order.
pub type Headers = BTreeMap<String, String>;

/// Error type for HTTP parsing and framing.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The bytes do not form a valid HTTP/1.1 message.
    #[error("malformed message: {0}")]
    Parse(String),

    /// The start line and headers exceeded the allowed size.
    #[error("message head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// The underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
