//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → candidate backend URLs (declared order)
//!     → health.rs (drop backends marked unhealthy)
//!     → round_robin.rs (pick cursor mod healthy count)
//!     → Return backend URL or none
//! ```
//!
//! # Design Decisions
//! - The balancer never changes health itself; the forwarding pipeline
//!   marks backends after connect/write/read/timeout failures
//! - No automatic recovery: an unhealthy backend stays out until it is
//!   re-marked healthy externally
//! - Healthy candidates keep the route's declared order so rotation is
//!   deterministic for a given cursor

pub mod health;
pub mod round_robin;

pub use health::HealthRegistry;
pub use round_robin::RoundRobin;

/// Round-robin selector over a route's backend list, filtered by health.
#[derive(Debug, Default)]
pub struct LoadBalancer {
    health: HealthRegistry,
    rotation: RoundRobin,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick one healthy backend from `candidates`, preserving declared
    /// order. Returns `None` when every candidate is marked unhealthy.
    pub fn select(&self, candidates: &[String]) -> Option<String> {
        let healthy: Vec<&String> = candidates
            .iter()
            .filter(|backend| self.health.is_healthy(backend))
            .collect();
        if healthy.is_empty() {
            return None;
        }
        let index = self.rotation.next_index(healthy.len());
        Some(healthy[index].clone())
    }

    pub fn mark_unhealthy(&self, backend: &str) {
        self.health.mark_unhealthy(backend);
    }

    pub fn mark_healthy(&self, backend: &str) {
        self.health.mark_healthy(backend);
    }

    pub fn is_healthy(&self, backend: &str) -> bool {
        self.health.is_healthy(backend)
    }
}
