//! Shiori: asynchronous bookmark enrichment
//!
//! This crate stores bookmarked URLs and enriches each one in the background
//! with the title and description scraped from the target page.

pub mod config;
pub mod enrich;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Shiori operations
#[derive(Debug, Error)]
pub enum ShioriError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Enrichment queue is closed")]
    QueueClosed,

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Shiori operations
pub type Result<T> = std::result::Result<T, ShioriError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use enrich::{
    extract_metadata, EnrichmentQueue, Executor, HttpFetcher, RetryPolicy, RetryScheduler,
    WorkerHandle,
};
pub use state::{AttemptState, BookmarkStatus, EnrichmentAttempt};
pub use storage::{Bookmark, SqliteStorage, StatusStore, Transition};
