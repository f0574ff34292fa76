//! Download history persistence
//!
//! SQLite store recording one row per finished download attempt.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`history`]: History inserts, queries and cleanup

use crate::types::{DownloadResult, HistoryEntry, ResultStatus};
use sqlx::{FromRow, sqlite::SqlitePool};

mod history;
mod migrations;

/// New history entry to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    /// The downloaded URL
    pub url: String,
    /// Media title
    pub title: Option<String>,
    /// Downloaded file path
    pub filename: Option<String>,
    /// Completion status code (see [`ResultStatus::to_i32`])
    pub status: i32,
    /// Size in bytes
    pub size_bytes: Option<u64>,
    /// Error message for failed downloads
    pub error: Option<String>,
    /// Unix timestamp when the download finished
    pub completed_at: i64,
}

impl From<&DownloadResult> for NewHistoryEntry {
    fn from(result: &DownloadResult) -> Self {
        NewHistoryEntry {
            url: result.url.clone(),
            title: result.title.clone(),
            filename: result.filename.clone(),
            status: result.status.to_i32(),
            size_bytes: result.size,
            error: result.error.clone(),
            completed_at: result.timestamp.timestamp(),
        }
    }
}

/// History record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    /// Unique database ID
    pub id: i64,
    /// The downloaded URL
    pub url: String,
    /// Media title
    pub title: Option<String>,
    /// Downloaded file path
    pub filename: Option<String>,
    /// Completion status code
    pub status: i32,
    /// Size in bytes
    pub size_bytes: Option<i64>,
    /// Error message for failed downloads
    pub error: Option<String>,
    /// Unix timestamp when the download finished
    pub completed_at: i64,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        use chrono::{TimeZone, Utc};

        HistoryEntry {
            id: row.id,
            url: row.url,
            title: row.title,
            filename: row.filename,
            status: ResultStatus::from_i32(row.status),
            size_bytes: row.size_bytes.map(|s| s as u64),
            error: row.error,
            completed_at: Utc
                .timestamp_opt(row.completed_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Database handle for download history
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
