//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::validate_config;

/// Error type for configuration loading.
///
/// IO, parse and semantic failures are one failure class with distinct
/// messages; callers either keep the previous config or exit.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = serde_json::from_str(&content)?;
    validate_config(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}
