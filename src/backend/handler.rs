//! Bounded-concurrency, retrying backend invoker.
//!
//! # Responsibilities
//! - Admit at most `max_concurrent_requests` invocations at a time
//! - Retry transient failures with doubling, capped backoff
//! - Honor cancellation while queued, while backing off and mid-call
//!
//! # State Machine
//! ```text
//! Admission ──permit──▶ Attempt(n) ──Ok──▶ Success
//!                          │
//!                          ├─ retryable && n <= max_retries ──▶ Backoff ──▶ Attempt(n+1)
//!                          └─ otherwise ──▶ Fail (last error)
//! ```
//!
//! The permit is held for the whole invocation, retries included, so a
//! request that is backing off still counts against the limit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, GenerationBackend, Turn};
use crate::config::MockServerConfig;
use crate::observability::metrics;
use crate::resilience::{decide, with_timeout, Backoff, RetryDecision};

/// Retry and deadline parameters for backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1_000,
            max_delay_ms: 32_000,
            attempt_timeout: Duration::from_secs(100),
        }
    }
}

impl RetrySettings {
    pub fn from_config(config: &MockServerConfig) -> Self {
        Self {
            max_retries: config.max_retries(),
            initial_delay_ms: config.initial_retry_delay_ms(),
            max_delay_ms: config.max_retry_delay_ms(),
            attempt_timeout: Duration::from_secs(config.request_timeout_secs()),
        }
    }
}

/// Invokes a [`GenerationBackend`] under an admission gate and retry policy.
pub struct BackendRequestHandler {
    backend: Arc<dyn GenerationBackend>,
    model: String,
    gate: Arc<Semaphore>,
    max_concurrent_requests: usize,
    settings: RetrySettings,
}

impl BackendRequestHandler {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        model: impl Into<String>,
        max_concurrent_requests: usize,
        settings: RetrySettings,
    ) -> Self {
        // A zero-permit gate would block forever.
        let max_concurrent_requests = max_concurrent_requests.max(1);
        Self {
            backend,
            model: model.into(),
            gate: Arc::new(Semaphore::new(max_concurrent_requests)),
            max_concurrent_requests,
            settings,
        }
    }

    pub fn from_config(backend: Arc<dyn GenerationBackend>, config: &MockServerConfig) -> Self {
        Self::new(
            backend,
            config.model(),
            config.max_concurrent_requests(),
            RetrySettings::from_config(config),
        )
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Free admission slots right now.
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    pub fn settings(&self) -> RetrySettings {
        self.settings
    }

    /// Submit `turns` to the backend, retrying transient failures.
    ///
    /// Returns the last observed error once the retry budget is spent.
    pub async fn invoke(&self, turns: &[Turn], cancel: &CancellationToken) -> Result<String, BackendError> {
        // Semaphore waiters are queued FIFO, so callers are admitted in arrival order.
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BackendError::Cancelled),
            permit = self.gate.acquire() => permit.map_err(|_| BackendError::Cancelled)?,
        };

        let mut backoff = Backoff::new(self.settings.initial_delay_ms, self.settings.max_delay_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                result = with_timeout(
                    self.settings.attempt_timeout,
                    self.backend.generate(turns, &self.model),
                ) => result,
            };

            let error = match outcome {
                Ok(body) if body.trim().is_empty() => BackendError::EmptyContent,
                Ok(body) => {
                    metrics::record_backend_attempt("success");
                    if attempt > 1 {
                        tracing::info!(attempt, "Backend call succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(e) => e,
            };

            match decide(&error, attempt, self.settings.max_retries) {
                RetryDecision::FailFast => {
                    metrics::record_backend_attempt("failure");
                    tracing::warn!(attempt, error = %error, "Backend call failed");
                    return Err(error);
                }
                RetryDecision::Retry => {
                    metrics::record_backend_attempt("retry");
                    let delay = backoff.next_delay();
                    tracing::info!(attempt, delay = ?delay, error = %error, "Retrying backend call");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for BackendRequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRequestHandler")
            .field("model", &self.model)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("settings", &self.settings)
            .finish()
    }
}
