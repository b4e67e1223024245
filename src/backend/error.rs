//! Generation backend errors.

use std::time::Duration;

use thiserror::Error;

/// A classified failure from the text-generation backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// HTTP 429.
    #[error("backend rate limit exceeded")]
    RateLimited,

    /// HTTP 5xx.
    #[error("backend server error (HTTP {status})")]
    Server { status: u16 },

    /// The attempt exceeded its deadline.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure before a status was received.
    #[error("backend transport error: {0}")]
    Transport(String),

    /// The backend rejected the request itself (malformed, unauthorized, ...).
    #[error("backend rejected the request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// The backend answered but produced no usable text.
    #[error("backend returned no content")]
    EmptyContent,

    /// The caller gave up.
    #[error("backend call cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::Server { status: 503 }.to_string(),
            "backend server error (HTTP 503)"
        );
        let err = BackendError::InvalidRequest {
            status: 401,
            message: "invalid api key".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }
}
