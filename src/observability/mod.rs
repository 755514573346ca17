//! Observability subsystem.
//!
//! Structured logging via the `tracing` ecosystem; each request carries a
//! request id through every handler log line. Leveled output goes to
//! stderr and to the configured log file.

pub mod logging;
