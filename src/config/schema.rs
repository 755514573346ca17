//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the JSON config
//! document. Absent keys take the documented defaults; unknown keys are
//! ignored.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// How a route's `path_pattern` is compared against a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Byte-for-byte equality.
    Exact,
    /// The request path starts with the pattern.
    Prefix,
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchType::Exact),
            "prefix" => Ok(MatchType::Prefix),
            _ => Err(format!("invalid match_type: {s:?}")),
        }
    }
}

// Accepts any casing on input ("exact", "EXACT", ...).
impl<'de> Deserialize<'de> for MatchType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single routing rule mapping a path pattern to a backend pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Route {
    /// Path to match, e.g. "/api/users".
    pub path_pattern: String,

    /// Exact or prefix comparison.
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,

    /// Upstream URLs, tried in declared order by the balancer.
    pub backends: Vec<String>,

    /// Lower values match first; ties keep declaration order.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_match_type() -> MatchType {
    MatchType::Prefix
}

fn default_priority() -> u32 {
    1
}

/// Root configuration for the gateway. Immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Port the listener binds on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Routing rules, matched in priority order.
    #[serde(default)]
    pub routes: Vec<Route>,

    /// Log level: debug, info, warn or error (case-insensitive).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file path; lines are appended.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Deadline for a whole upstream exchange (dial + write + read).
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,

    /// Deadline for reading a request off a client connection.
    #[serde(default = "default_client_timeout_ms")]
    pub client_timeout_ms: u64,

    /// Maximum concurrent client connections (backpressure).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("gateway.log")
}

fn default_backend_timeout_ms() -> u64 {
    5000
}

fn default_client_timeout_ms() -> u64 {
    30_000
}

fn default_max_connections() -> usize {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            routes: Vec::new(),
            log_level: default_log_level(),
            log_file: default_log_file(),
            backend_timeout_ms: default_backend_timeout_ms(),
            client_timeout_ms: default_client_timeout_ms(),
            max_connections: default_max_connections(),
        }
    }
}

impl GatewayConfig {
    /// Backend timeout as a [`Duration`].
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Client read timeout as a [`Duration`].
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }
}
