use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Shiori
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Timeout for a single GET request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("shiori/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per enrichment cycle, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between consecutive attempts (seconds)
    #[serde(rename = "backoff-secs")]
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 60,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./shiori.db".to_string(),
        }
    }
}
