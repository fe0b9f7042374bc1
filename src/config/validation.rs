use crate::config::types::{Config, FetcherConfig, RetryConfig, StorageConfig};
use crate::ConfigError;

/// Upper bound on attempts per enrichment cycle
const MAX_ATTEMPTS_LIMIT: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_retry_config(&config.retry)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > MAX_ATTEMPTS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS_LIMIT, config.max_attempts
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
