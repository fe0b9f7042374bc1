//! Storage module for persisting bookmarks
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Bookmark creation, lookup, listing and soft deletion
//! - Applying the enrichment transitions produced by the retry scheduler

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{StatusStore, StorageError, StorageResult};

use crate::state::BookmarkStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest URL accepted for a new bookmark
pub const MAX_URL_LENGTH: usize = 2048;

/// Represents a bookmark in the database
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub enriched_at: Option<DateTime<Utc>>,
    pub failed: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn status(&self) -> BookmarkStatus {
        BookmarkStatus::derive(self.enriched_at.is_some(), self.failed)
    }

    pub fn is_pending(&self) -> bool {
        self.status() == BookmarkStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.status() == BookmarkStatus::Failed
    }

    pub fn is_completed(&self) -> bool {
        self.status() == BookmarkStatus::Completed
    }
}

/// A state change written back by the retry scheduler
///
/// Each variant is applied as a single update so readers never observe a
/// half-written transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Enrichment succeeded: store metadata, clear `failed` and `last_error`
    Completed {
        title: Option<String>,
        description: Option<String>,
        enriched_at: DateTime<Utc>,
    },

    /// The retry budget is exhausted: set `failed`, keep `enriched_at`
    Failed { last_error: String },
}

/// Validates a URL submitted for a new bookmark
///
/// The URL must be present, parse as an absolute http(s) URL with a host, and
/// fit in [`MAX_URL_LENGTH`] characters.
pub fn validate_url(url: &str) -> StorageResult<()> {
    if url.trim().is_empty() {
        return Err(StorageError::InvalidUrl("A URL is required".to_string()));
    }

    if url.chars().count() > MAX_URL_LENGTH {
        return Err(StorageError::InvalidUrl(format!(
            "The URL may not be longer than {} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed = ::url::Url::parse(url)
        .map_err(|_| StorageError::InvalidUrl("The URL format is invalid".to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(StorageError::InvalidUrl(
            "The URL format is invalid".to_string(),
        ));
    }

    Ok(())
}
