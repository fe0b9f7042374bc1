//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::BookmarkStatus;
use crate::storage::{Bookmark, Transition};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bookmark not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for bookmark storage backends
///
/// Implementations are shared between concurrently running enrichment tasks,
/// so every method takes `&self` and must be safe to call from any thread.
/// Soft-deleted bookmarks behave as if they do not exist.
pub trait StatusStore: Send + Sync {
    /// Creates a new pending bookmark for `url`
    ///
    /// Fails with `InvalidUrl` if the URL does not pass validation.
    fn create(&self, url: &str) -> StorageResult<Bookmark>;

    /// Gets a bookmark by ID
    fn get(&self, id: Uuid) -> StorageResult<Bookmark>;

    /// Lists bookmarks, newest first, optionally restricted to one status
    fn list(&self, status: Option<BookmarkStatus>) -> StorageResult<Vec<Bookmark>>;

    /// Applies an enrichment transition atomically
    ///
    /// Only the columns owned by the transition are written, against the
    /// current row, so a concurrent edit to other columns is preserved.
    fn apply_transition(&self, id: Uuid, transition: &Transition) -> StorageResult<()>;

    /// Clears `failed` and `last_error` ahead of a manual retry
    ///
    /// Returns the updated bookmark.
    fn reset_for_retry(&self, id: Uuid) -> StorageResult<Bookmark>;

    /// Soft-deletes a bookmark
    fn delete(&self, id: Uuid) -> StorageResult<()>;
}
