//! Retry classification.
//!
//! Rate limits, server errors (500-504), timeouts and transport failures are
//! transient. Everything the backend rejects on its merits (bad request, auth)
//! and empty output are not, because repeating the call cannot change them.

use crate::backend::BackendError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the next backoff delay and try again.
    Retry,
    /// Give up and return the error.
    FailFast,
}

/// Returns true if `error` is worth another attempt.
pub fn is_retryable(error: &BackendError) -> bool {
    match error {
        BackendError::RateLimited
        | BackendError::Timeout(_)
        | BackendError::Transport(_) => true,
        BackendError::Server { status } => (500..=504).contains(status),
        BackendError::InvalidRequest { .. } | BackendError::EmptyContent | BackendError::Cancelled => false,
    }
}

/// Decide whether attempt number `attempt` (1-based) may be followed by another.
pub fn decide(error: &BackendError, attempt: u32, max_retries: u32) -> RetryDecision {
    if is_retryable(error) && attempt <= max_retries {
        RetryDecision::Retry
    } else {
        RetryDecision::FailFast
    }
}

/// Map a non-success HTTP status from the backend to an error.
pub fn classify_status(status: u16, message: impl Into<String>) -> BackendError {
    match status {
        429 => BackendError::RateLimited,
        500..=599 => BackendError::Server { status },
        _ => BackendError::InvalidRequest {
            status,
            message: message.into(),
        },
    }
}
