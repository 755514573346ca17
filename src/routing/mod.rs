//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (scan routes in priority order)
//!     → Return: matched Route or no match
//!
//! Table build (startup and reload):
//!     Route[] from config
//!     → Stable sort by priority
//!     → Published inside the config snapshot, immutable
//! ```
//!
//! # Design Decisions
//! - Table is rebuilt wholesale on reload, never mutated once published
//! - No path normalisation: no trailing-slash collapsing, no
//!   percent-decoding, no case folding
//! - First match wins; O(n) scan is fine for typical route counts

pub mod router;

pub use router::RoutingTable;
