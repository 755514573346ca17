//! Backend health registry.

use dashmap::DashMap;

/// Process-wide backend health map keyed by backend URL.
///
/// A backend with no entry is healthy. Entries are written only by the
/// forwarding pipeline and never removed implicitly, so a backend that
/// drops out of the routing table keeps its state should it return.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    state: DashMap<String, bool>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_unhealthy(&self, backend: &str) {
        let previous = self.state.insert(backend.to_string(), false);
        if previous != Some(false) {
            tracing::warn!(backend, "backend marked unhealthy");
        }
    }

    pub fn mark_healthy(&self, backend: &str) {
        let previous = self.state.insert(backend.to_string(), true);
        if previous == Some(false) {
            tracing::info!(backend, "backend marked healthy");
        }
    }

    /// Defaults to healthy for unknown backends.
    pub fn is_healthy(&self, backend: &str) -> bool {
        self.state.get(backend).map(|entry| *entry).unwrap_or(true)
    }
}
