//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::MockServerConfig;
use crate::config::validation::validate_config;
use crate::config::ConfigError;

/// Environment variable consulted when the file carries no credential.
pub const API_KEY_ENV: &str = "MOCK_SERVER_API_KEY";

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MockServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, std::env::var(API_KEY_ENV).ok())?;

    tracing::debug!(path = %path.display(), routes = config.routes().len(), "Config file loaded");
    Ok(config)
}

/// Parse and validate config text, filling the credential from `env_api_key`
/// when the text has none.
pub fn parse_config(content: &str, env_api_key: Option<String>) -> Result<MockServerConfig, ConfigError> {
    let mut config: MockServerConfig = toml::from_str(content)?;

    if let Some(key) = env_api_key.filter(|k| !k.trim().is_empty()) {
        config.fill_api_key_if_missing(key);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
