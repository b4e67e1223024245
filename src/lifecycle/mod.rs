//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → logging/metrics → MockServer::new → start listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → MockServer::stop (drain in-flight requests) → exit
//! ```

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::run;
