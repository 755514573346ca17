//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main):
//!     Load config → Init logging → Start gateway → Enable hot reload
//!
//! Shutdown:
//!     SIGINT/SIGTERM → stop watcher → close listener → drain → exit 0
//! ```

pub mod signals;
