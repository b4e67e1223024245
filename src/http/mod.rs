//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, request ID, tracing, body limit)
//!     → request.rs (buffer into MockRequest)
//!     → pipeline (route, strategy)
//!     → response.rs (MockResponse or error envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MockRequest, X_REQUEST_ID};
pub use response::{ErrorEnvelope, MockResponse};
pub use server::MockServer;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from constructing, starting or stopping a [`MockServer`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server is already running")]
    AlreadyRunning,

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
