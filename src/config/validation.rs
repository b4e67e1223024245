//! Configuration validation.
//!
//! # Responsibilities
//! - Range checks shared by setters and the file loader
//! - URL checks for the backend endpoint and proxy targets
//! - Whole-config validation that reports every problem at once

use std::fmt;
use std::ops::RangeInclusive;

use url::Url;

use crate::config::schema::{MockServerConfig, StrategyDefinition};
use crate::config::ConfigError;

pub const MAX_RETRIES_RANGE: RangeInclusive<u32> = 0..=10;
pub const INITIAL_RETRY_DELAY_MS_RANGE: RangeInclusive<u64> = 100..=60_000;
pub const MAX_RETRY_DELAY_MS_RANGE: RangeInclusive<u64> = 1_000..=300_000;
pub const MAX_CONCURRENT_REQUESTS_RANGE: RangeInclusive<usize> = 1..=100;
pub const REQUEST_TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=600;

/// A single semantic problem found in a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        let field = match &err {
            ConfigError::InvalidUrl { field, .. } | ConfigError::OutOfRange { field, .. } => {
                (*field).to_string()
            }
            ConfigError::Empty(field) => (*field).to_string(),
            _ => "config".to_string(),
        };
        Self {
            field,
            message: err.to_string(),
        }
    }
}

/// Reject `value` unless it lies inside `range`.
pub fn check_range<T>(field: &'static str, value: T, range: RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

/// Parse `value` as an absolute http(s) URL.
pub fn check_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Parse a proxy upstream. The forwarding client speaks plain HTTP only.
pub fn check_proxy_target(value: &str) -> Result<Url, ConfigError> {
    let url = check_url("proxy target", value)?;
    if url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl {
            field: "proxy target",
            value: value.to_string(),
        });
    }
    Ok(url)
}

/// Validate a deserialized config. Returns every error found, not just the first.
///
/// The credential is deliberately not checked here; it is required when a
/// server is constructed, after environment fallbacks have been applied.
pub fn validate_config(config: &MockServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = Vec::new();

    let checks = [
        check_range("max_retries", config.max_retries(), MAX_RETRIES_RANGE),
        check_range(
            "initial_retry_delay_ms",
            config.initial_retry_delay_ms(),
            INITIAL_RETRY_DELAY_MS_RANGE,
        ),
        check_range(
            "max_retry_delay_ms",
            config.max_retry_delay_ms(),
            MAX_RETRY_DELAY_MS_RANGE,
        ),
        check_range(
            "max_concurrent_requests",
            config.max_concurrent_requests(),
            MAX_CONCURRENT_REQUESTS_RANGE,
        ),
        check_range(
            "request_timeout_secs",
            config.request_timeout_secs(),
            REQUEST_TIMEOUT_SECS_RANGE,
        ),
    ];
    errors.extend(checks.into_iter().filter_map(Result::err).map(ValidationError::from));

    if let Some(endpoint) = config.endpoint() {
        if let Err(e) = check_url("endpoint", endpoint) {
            errors.push(e.into());
        }
    }

    if config.model().trim().is_empty() {
        errors.push(ConfigError::Empty("model").into());
    }

    if config.max_body_bytes() == 0 {
        errors.push(ValidationError {
            field: "max_body_bytes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    for (i, route) in config.routes().iter().enumerate() {
        if route.pattern.trim().is_empty() {
            errors.push(ValidationError {
                field: format!("routes[{}].pattern", i),
                message: "must not be empty".to_string(),
            });
        }
        if let StrategyDefinition::Proxy { target, .. } = &route.strategy {
            if let Err(e) = check_proxy_target(target) {
                errors.push(ValidationError {
                    field: format!("routes[{}].strategy.target", i),
                    message: e.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
