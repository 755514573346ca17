//! Semantic validation of a parsed configuration.

use crate::config::schema::GatewayConfig;

const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Check a parsed config for errors the type system cannot express.
///
/// Returns the first problem found as a human-readable message.
pub fn validate_config(config: &GatewayConfig) -> Result<(), String> {
    if config.listen_port == 0 {
        return Err("listen_port must be between 1 and 65535".to_string());
    }

    if config.routes.is_empty() {
        return Err("no routes configured".to_string());
    }

    for route in &config.routes {
        if route.path_pattern.is_empty() {
            return Err("route path_pattern cannot be empty".to_string());
        }
        if route.backends.is_empty() {
            return Err(format!(
                "route {:?} must have at least one backend",
                route.path_pattern
            ));
        }
        if route.backends.iter().any(|b| b.is_empty()) {
            return Err(format!(
                "route {:?} has an empty backend URL",
                route.path_pattern
            ));
        }
    }

    if config.backend_timeout_ms == 0 {
        return Err("backend_timeout_ms must be positive".to_string());
    }
    if config.client_timeout_ms == 0 {
        return Err("client_timeout_ms must be positive".to_string());
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        return Err(format!(
            "invalid log_level {:?}: must be debug, info, warn or error",
            config.log_level
        ));
    }

    Ok(())
}
