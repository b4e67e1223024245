//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! (ordered instructions, canonical request description)
//!     → key.rs (SHA-256, hex)
//!     → store.rs (one JSON record per key on disk)
//! ```
//!
//! # Design Decisions
//! - No locking: concurrent writes to one key are last-write-wins
//! - Read problems degrade to a miss; write problems are reported to the
//!   caller, which logs them and still serves the response

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{CacheEntry, CacheStore};

use thiserror::Error;

/// Errors from cache writes.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
