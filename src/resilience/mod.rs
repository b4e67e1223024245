//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend call:
//!     → timeouts.rs (per-attempt deadline)
//!     → On failure: retries.rs (classify: retry or fail fast)
//!     → backoff.rs (doubling delay, capped, no jitter)
//! ```
//!
//! # Design Decisions
//! - Every backend call has a deadline
//! - Backoff is deterministic so tests can assert exact delays
//! - Classification is a pure function of the error

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::{calculate_backoff, Backoff};
pub use retries::{classify_status, decide, is_retryable, RetryDecision};
pub use timeouts::with_timeout;
