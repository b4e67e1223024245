//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or programmatic setters
//!     → loader.rs (parse, env credential fallback)
//!     → validation.rs (range and URL checks, all errors collected)
//!     → MockServerConfig (validated)
//!     → consumed by MockServer at construction
//! ```
//!
//! # Design Decisions
//! - Numeric options are range-checked when assigned, not when used
//! - All fields have defaults so an empty file is a valid config
//! - The backend credential is checked at server construction (fail fast)

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::{MockServerConfig, RouteDefinition, RouteInstructionDefinition, StrategyDefinition};
pub use validation::ValidationError;

use thiserror::Error;

/// Errors raised while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No backend credential was supplied.
    #[error("backend API key is required")]
    MissingCredential,

    /// A URL option was not an absolute http(s) URL.
    #[error("invalid URL for {field}: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    /// A numeric option fell outside its permitted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    /// A required text option was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The outbound HTTP client could not be built.
    #[error("HTTP client initialisation failed: {0}")]
    HttpClient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more semantic checks failed on a loaded file.
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
