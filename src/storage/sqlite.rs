//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StatusStore trait.

use crate::state::BookmarkStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StatusStore, StorageError, StorageResult};
use crate::storage::{validate_url, Bookmark, Transition};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const BOOKMARK_COLUMNS: &str =
    "id, url, title, description, enriched_at, failed, last_error, created_at, updated_at";

/// SQLite storage backend
///
/// The connection sits behind a mutex so a single store can be shared by
/// every enrichment task.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }
}

impl StatusStore for SqliteStorage {
    fn create(&self, url: &str) -> StorageResult<Bookmark> {
        validate_url(url)?;

        let id = Uuid::new_v4();
        let now = format_timestamp(&Utc::now());

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO bookmarks (id, url, failed, created_at, updated_at) VALUES (?1, ?2, 0, ?3, ?3)",
            params![id.to_string(), url, now],
        )?;

        fetch_bookmark(&conn, id)
    }

    fn get(&self, id: Uuid) -> StorageResult<Bookmark> {
        let conn = self.lock()?;
        fetch_bookmark(&conn, id)
    }

    fn list(&self, status: Option<BookmarkStatus>) -> StorageResult<Vec<Bookmark>> {
        let filter = match status {
            None => "",
            Some(BookmarkStatus::Pending) => " AND enriched_at IS NULL AND failed = 0",
            Some(BookmarkStatus::Failed) => " AND failed = 1",
            Some(BookmarkStatus::Completed) => " AND enriched_at IS NOT NULL AND failed = 0",
        };
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE deleted_at IS NULL{} ORDER BY created_at DESC, rowid DESC",
            BOOKMARK_COLUMNS, filter
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let bookmarks = stmt
            .query_map([], row_to_bookmark)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bookmarks)
    }

    fn apply_transition(&self, id: Uuid, transition: &Transition) -> StorageResult<()> {
        let now = format_timestamp(&Utc::now());
        let conn = self.lock()?;

        let changed = match transition {
            Transition::Completed {
                title,
                description,
                enriched_at,
            } => conn.execute(
                "UPDATE bookmarks SET title = ?1, description = ?2, enriched_at = ?3,
                 failed = 0, last_error = NULL, updated_at = ?4
                 WHERE id = ?5 AND deleted_at IS NULL",
                params![
                    title,
                    description,
                    format_timestamp(enriched_at),
                    now,
                    id.to_string()
                ],
            )?,
            Transition::Failed { last_error } => conn.execute(
                "UPDATE bookmarks SET failed = 1, last_error = ?1, updated_at = ?2
                 WHERE id = ?3 AND deleted_at IS NULL",
                params![last_error, now, id.to_string()],
            )?,
        };

        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }

        Ok(())
    }

    fn reset_for_retry(&self, id: Uuid) -> StorageResult<Bookmark> {
        let now = format_timestamp(&Utc::now());
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE bookmarks SET failed = 0, last_error = NULL, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id.to_string()],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }

        fetch_bookmark(&conn, id)
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        let now = format_timestamp(&Utc::now());
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE bookmarks SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id.to_string()],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }

        Ok(())
    }
}

fn fetch_bookmark(conn: &Connection, id: Uuid) -> StorageResult<Bookmark> {
    let sql = format!(
        "SELECT {} FROM bookmarks WHERE id = ?1 AND deleted_at IS NULL",
        BOOKMARK_COLUMNS
    );

    conn.query_row(&sql, params![id.to_string()], row_to_bookmark)
        .optional()?
        .ok_or(StorageError::NotFound(id))
}

fn row_to_bookmark(row: &Row<'_>) -> rusqlite::Result<Bookmark> {
    let id: String = row.get(0)?;
    let enriched_at: Option<String> = row.get(4)?;

    Ok(Bookmark {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        enriched_at: enriched_at
            .map(|s| parse_timestamp(4, &s))
            .transpose()?,
        failed: row.get(5)?,
        last_error: row.get(6)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}
