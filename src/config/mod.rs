//! Configuration module for Shiori
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; missing sections fall back to the defaults of a
//! 10 second fetch timeout and three attempts spaced 60 seconds apart.
//!
//! # Example
//!
//! ```no_run
//! use shiori::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shiori.toml")).unwrap();
//! println!("Attempts per cycle: {}", config.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, RetryConfig, StorageConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
