//! HTTP/1.1 reverse-proxy gateway.
//!
//! Terminates client connections, matches each request against a
//! priority-ordered routing table, picks a healthy backend by round-robin,
//! forwards the request over a fresh upstream connection and relays the
//! response. Configuration is a JSON file, hot-reloaded by an mtime
//! watcher and published as an atomic snapshot so in-flight requests are
//! never torn by a reload.

// Core subsystems
pub mod config;
pub mod gateway;
pub mod http;
pub mod routing;
pub mod upstream;

// Traffic management
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
