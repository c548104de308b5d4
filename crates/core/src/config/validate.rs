use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Console base URL is set and every console interval is positive
/// - Batch worker pool has at least one worker
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Console validation
    let console = &config.console;
    if console.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "console.base_url cannot be empty".to_string(),
        ));
    }
    for (name, value) in [
        ("console.status_poll_interval_ms", console.status_poll_interval_ms),
        ("console.dashboard_refresh_interval_ms", console.dashboard_refresh_interval_ms),
        ("console.request_timeout_secs", console.request_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} must be positive", name)));
        }
    }
    if console.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "console.event_buffer must be positive".to_string(),
        ));
    }

    // Batch validation
    if config.batch.workers == 0 {
        return Err(ConfigError::ValidationError(
            "batch.workers must be at least 1".to_string(),
        ));
    }

    Ok(())
}
