//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route + selected backend URL
//!     → client.rs (parse URL, dial, write request, read response)
//!     → One deadline spans the whole exchange
//!     → Return response, or a classified ForwardError
//! ```

pub mod client;

pub use client::{ForwardError, UpstreamClient};
