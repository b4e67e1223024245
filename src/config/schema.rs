//! Configuration schema definitions.
//!
//! `MockServerConfig` deserializes from TOML and exposes validated setters for
//! programmatic use. Fields are private so a range-checked option can never be
//! assigned an out-of-range value after construction.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::validation::{
    check_range, check_url, INITIAL_RETRY_DELAY_MS_RANGE, MAX_CONCURRENT_REQUESTS_RANGE,
    MAX_RETRIES_RANGE, MAX_RETRY_DELAY_MS_RANGE, REQUEST_TIMEOUT_SECS_RANGE,
};
use crate::config::ConfigError;

/// Default chat-completions endpoint used when no override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Root configuration for the mock server.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockServerConfig {
    /// Credential for the generation backend.
    api_key: Option<String>,

    /// Optional backend endpoint override.
    endpoint: Option<String>,

    /// Model identifier sent to the backend.
    model: String,

    /// Display name of the simulated API, used in the default instructions.
    api_name: String,

    cache_enabled: bool,
    cache_directory: PathBuf,

    /// Host the listener binds to.
    bind_host: String,

    /// Listen port; 0 picks an ephemeral port.
    port: u16,

    max_retries: u32,
    initial_retry_delay_ms: u64,
    max_retry_delay_ms: u64,
    max_concurrent_requests: usize,

    /// Per-attempt deadline for a backend call.
    request_timeout_secs: u64,

    /// Largest request body buffered by the server.
    max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error).
    log_level: String,

    /// Prometheus exporter bind address (binary only).
    metrics_address: Option<String>,

    /// Global instructions applied to every generated response.
    instructions: Vec<String>,

    /// Routes declared in the config file.
    routes: Vec<RouteDefinition>,

    /// Route-scoped instructions declared in the config file.
    route_instructions: Vec<RouteInstructionDefinition>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_name: "Mock API".to_string(),
            cache_enabled: true,
            cache_directory: PathBuf::from(".mock-cache"),
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            max_retries: 5,
            initial_retry_delay_ms: 1_000,
            max_retry_delay_ms: 32_000,
            max_concurrent_requests: 10,
            request_timeout_secs: 100,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            log_level: "info".to_string(),
            metrics_address: None,
            instructions: Vec::new(),
            routes: Vec::new(),
            route_instructions: Vec::new(),
        }
    }
}

impl MockServerConfig {
    /// Create a default config carrying the given backend credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.set_api_key(api_key);
        config
    }

    // --- Getters ---

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Return the credential, failing if it is missing or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// The configured endpoint, or the default one.
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn bind_host(&self) -> &str {
        &self.bind_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_retry_delay_ms(&self) -> u64 {
        self.initial_retry_delay_ms
    }

    pub fn max_retry_delay_ms(&self) -> u64 {
        self.max_retry_delay_ms
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn metrics_address(&self) -> Option<&str> {
        self.metrics_address.as_deref()
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn route_instructions(&self) -> &[RouteInstructionDefinition] {
        &self.route_instructions
    }

    // --- Setters (validated on assignment) ---

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub(crate) fn fill_api_key_if_missing(&mut self, api_key: String) {
        if self.api_key.is_none() {
            self.api_key = Some(api_key);
        }
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> Result<(), ConfigError> {
        let endpoint = endpoint.into();
        check_url("endpoint", &endpoint)?;
        self.endpoint = Some(endpoint);
        Ok(())
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), ConfigError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(ConfigError::Empty("model"));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_api_name(&mut self, api_name: impl Into<String>) {
        self.api_name = api_name.into();
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    pub fn set_cache_directory(&mut self, dir: impl Into<PathBuf>) {
        self.cache_directory = dir.into();
    }

    pub fn set_bind_host(&mut self, host: impl Into<String>) {
        self.bind_host = host.into();
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn set_max_retries(&mut self, value: u32) -> Result<(), ConfigError> {
        check_range("max_retries", value, MAX_RETRIES_RANGE)?;
        self.max_retries = value;
        Ok(())
    }

    pub fn set_initial_retry_delay_ms(&mut self, value: u64) -> Result<(), ConfigError> {
        check_range("initial_retry_delay_ms", value, INITIAL_RETRY_DELAY_MS_RANGE)?;
        self.initial_retry_delay_ms = value;
        Ok(())
    }

    pub fn set_max_retry_delay_ms(&mut self, value: u64) -> Result<(), ConfigError> {
        check_range("max_retry_delay_ms", value, MAX_RETRY_DELAY_MS_RANGE)?;
        self.max_retry_delay_ms = value;
        Ok(())
    }

    pub fn set_max_concurrent_requests(&mut self, value: usize) -> Result<(), ConfigError> {
        check_range("max_concurrent_requests", value, MAX_CONCURRENT_REQUESTS_RANGE)?;
        self.max_concurrent_requests = value;
        Ok(())
    }

    pub fn set_request_timeout_secs(&mut self, value: u64) -> Result<(), ConfigError> {
        check_range("request_timeout_secs", value, REQUEST_TIMEOUT_SECS_RANGE)?;
        self.request_timeout_secs = value;
        Ok(())
    }

    pub fn set_max_body_bytes(&mut self, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_body_bytes",
                value: "0".to_string(),
                min: "1".to_string(),
                max: usize::MAX.to_string(),
            });
        }
        self.max_body_bytes = value;
        Ok(())
    }

    pub fn set_log_level(&mut self, level: impl Into<String>) {
        self.log_level = level.into();
    }

    pub fn add_instruction(&mut self, instruction: impl Into<String>) {
        self.instructions.push(instruction.into());
    }
}

// Hand-written so the credential never reaches logs.
impl fmt::Debug for MockServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.effective_endpoint())
            .field("model", &self.model)
            .field("api_name", &self.api_name)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_directory", &self.cache_directory)
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("max_retries", &self.max_retries)
            .field("initial_retry_delay_ms", &self.initial_retry_delay_ms)
            .field("max_retry_delay_ms", &self.max_retry_delay_ms)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("routes", &self.routes.len())
            .finish()
    }
}

/// A route declared in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteDefinition {
    /// Path pattern with `{name}` and `{*}` placeholders.
    pub pattern: String,

    /// HTTP method, or `*` for any.
    #[serde(default = "default_method")]
    pub method: String,

    /// How responses for this route are produced.
    pub strategy: StrategyDefinition,
}

/// Route-scoped instructions declared in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteInstructionDefinition {
    pub pattern: String,

    #[serde(default = "default_method")]
    pub method: String,

    pub instructions: Vec<String>,
}

/// Serialized form of a response strategy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyDefinition {
    /// A canned body.
    Static {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default = "default_content_type")]
        content_type: String,
        body: String,
    },

    /// A body read from disk on every request.
    File {
        path: PathBuf,
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default = "default_content_type")]
        content_type: String,
    },

    /// Forward to a real upstream and cache successful responses.
    Proxy { target: String },

    /// Generate the body with the text-generation backend.
    Generated {
        #[serde(default = "default_content_type")]
        content_type: String,
    },
}

fn default_method() -> String {
    "*".to_string()
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "application/json".to_string()
}
