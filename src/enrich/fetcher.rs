//! HTTP page fetcher
//!
//! This module handles the outbound request for an enrichment attempt:
//! - Building the HTTP client with the configured user agent and timeout
//! - A single GET per call, with no retries (the retry scheduler owns those)
//! - Classifying failures into HTTP status errors and transport errors

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a page could not be fetched
///
/// Both kinds are retryable; the scheduler makes no distinction between them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status
    #[error("Failed to fetch URL: HTTP status {0}")]
    HttpStatus(u16),

    /// DNS, TCP, TLS, timeout or body read failure
    #[error("{0}")]
    Connection(String),
}

/// Something that can retrieve the raw body of a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use shiori::config::FetcherConfig;
/// use shiori::enrich::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    client_builder(&config.user_agent, config.timeout()).build()
}

fn client_builder(user_agent: &str, timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
}

/// `PageFetcher` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Builds a fetcher with the default user agent and a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let defaults = FetcherConfig::default();
        Ok(Self {
            client: client_builder(&defaults.user_agent, timeout).build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(classify_transport_error)
    }
}

/// Maps a reqwest error to a `Connection` error with a readable message
fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Connection(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        FetchError::Connection(format!("Connection failed: {}", e))
    } else {
        FetchError::Connection(e.to_string())
    }
}
