//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → Prometheus scrape (binary only, optional)
//! ```
//!
//! # Design Decisions
//! - The request ID is set by middleware and appears on the HTTP span
//! - Metrics are cheap and silent when no recorder is installed

pub mod logging;
pub mod metrics;
