//! Error types for videomilker
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Download, Queue, Database, etc.)
//! - Classification of raw yt-dlp failure messages into [`DownloadError`] kinds
//! - User-facing messages and suggestions for display layers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for videomilker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for videomilker
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.max_concurrent")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A single download failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Queue operation rejected
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Batch file could not be read or written
    #[error("batch file error for {path}: {reason}")]
    BatchFile {
        /// The batch file involved
        path: PathBuf,
        /// Why the operation failed
        reason: String,
    },

    /// URL failed pre-flight validation
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp could not be spawned, bad output, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Queue state-machine errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// Processing was requested but no item is waiting
    #[error("queue has no pending URLs")]
    Empty,

    /// Cannot perform operation in current state
    #[error("cannot {operation} queue in state {current_state}")]
    InvalidState {
        /// The operation that was attempted (e.g., "pause", "resume", "clear")
        operation: String,
        /// The current state that prevents the operation (e.g., "idle", "running")
        current_state: String,
    },
}

/// Classified download failures
///
/// yt-dlp reports failures as free-form text. [`DownloadError::from_message`]
/// maps that text onto a kind; every variant keeps the original message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Video is private
    #[error("private content: {0}")]
    PrivateContent(String),

    /// Video requires age verification
    #[error("age restricted: {0}")]
    AgeRestricted(String),

    /// Video is blocked in the caller's region
    #[error("geo restricted: {0}")]
    GeoRestricted(String),

    /// Video was removed or never existed
    #[error("content unavailable: {0}")]
    Unavailable(String),

    /// Access denied by the remote site (HTTP 403)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Too many requests (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network failure (HTTP 503, unreachable host)
    #[error("network error: {0}")]
    Network(String),

    /// Connection timed out
    #[error("timed out: {0}")]
    Timeout(String),

    /// Local disk is full
    #[error("insufficient disk space: {0}")]
    InsufficientSpace(String),

    /// Local write permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Requested quality or format is not offered
    #[error("format not available: {0}")]
    FormatUnavailable(String),

    /// No downloadable formats were found
    #[error("no formats found: {0}")]
    NoFormats(String),

    /// Download was cancelled
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Any failure that matched no known pattern
    #[error("{0}")]
    Failed(String),
}

/// Message fragments in the order they are checked; first match wins.
const MESSAGE_PATTERNS: &[(&str, fn(String) -> DownloadError)] = &[
    ("private video", DownloadError::PrivateContent),
    ("age-restricted video", DownloadError::AgeRestricted),
    ("video is private", DownloadError::PrivateContent),
    ("video unavailable in your country", DownloadError::GeoRestricted),
    ("this video is not available", DownloadError::Unavailable),
    ("sign in to confirm your age", DownloadError::AgeRestricted),
    ("this video is private", DownloadError::PrivateContent),
    ("video unavailable", DownloadError::Unavailable),
    ("http error 403", DownloadError::Authentication),
    ("http error 404", DownloadError::Unavailable),
    ("http error 429", DownloadError::RateLimited),
    ("http error 503", DownloadError::Network),
    ("connection timeout", DownloadError::Timeout),
    ("timed out", DownloadError::Timeout),
    ("network unreachable", DownloadError::Network),
    ("no space left on device", DownloadError::InsufficientSpace),
    ("permission denied", DownloadError::PermissionDenied),
    ("access denied", DownloadError::PermissionDenied),
    ("format not available", DownloadError::FormatUnavailable),
    ("requested format is not available", DownloadError::FormatUnavailable),
    ("no formats found", DownloadError::NoFormats),
    ("no video formats found", DownloadError::NoFormats),
    ("no audio formats found", DownloadError::NoFormats),
];

impl DownloadError {
    /// Classify a raw failure message (case-insensitive substring match)
    ///
    /// # Examples
    ///
    /// ```
    /// use videomilker::DownloadError;
    ///
    /// let err = DownloadError::from_message("ERROR: HTTP Error 429: Too Many Requests");
    /// assert!(matches!(err, DownloadError::RateLimited(_)));
    /// ```
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        match MESSAGE_PATTERNS
            .iter()
            .find(|(pattern, _)| lowered.contains(pattern))
        {
            Some((_, build)) => build(message),
            None => DownloadError::Failed(message),
        }
    }

    /// The original message reported by the executor
    pub fn message(&self) -> &str {
        match self {
            DownloadError::PrivateContent(m)
            | DownloadError::AgeRestricted(m)
            | DownloadError::GeoRestricted(m)
            | DownloadError::Unavailable(m)
            | DownloadError::Authentication(m)
            | DownloadError::RateLimited(m)
            | DownloadError::Network(m)
            | DownloadError::Timeout(m)
            | DownloadError::InsufficientSpace(m)
            | DownloadError::PermissionDenied(m)
            | DownloadError::FormatUnavailable(m)
            | DownloadError::NoFormats(m)
            | DownloadError::Cancelled(m)
            | DownloadError::Failed(m) => m,
        }
    }

    /// Machine-readable kind, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            DownloadError::PrivateContent(_) => "private_content",
            DownloadError::AgeRestricted(_) => "age_restricted",
            DownloadError::GeoRestricted(_) => "geo_restricted",
            DownloadError::Unavailable(_) => "unavailable",
            DownloadError::Authentication(_) => "authentication",
            DownloadError::RateLimited(_) => "rate_limited",
            DownloadError::Network(_) => "network",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::InsufficientSpace(_) => "insufficient_space",
            DownloadError::PermissionDenied(_) => "permission_denied",
            DownloadError::FormatUnavailable(_) => "format_unavailable",
            DownloadError::NoFormats(_) => "no_formats",
            DownloadError::Cancelled(_) => "cancelled",
            DownloadError::Failed(_) => "download_failed",
        }
    }

    /// Short explanation suitable for end users
    pub fn user_message(&self) -> &str {
        match self {
            DownloadError::Unavailable(_) => "This video is not available for download.",
            DownloadError::PrivateContent(_) => "This video is private and cannot be downloaded.",
            DownloadError::AgeRestricted(_) => "This video has age restrictions.",
            DownloadError::GeoRestricted(_) => "This video is not available in your region.",
            DownloadError::Authentication(_) => "Authentication failed. You may need to log in.",
            DownloadError::RateLimited(_) => {
                "Too many requests. Please wait before trying again."
            }
            DownloadError::Network(_) => "Network connection failed.",
            DownloadError::Timeout(_) => "The download timed out.",
            DownloadError::InsufficientSpace(_) => "Not enough disk space for the download.",
            DownloadError::PermissionDenied(_) => {
                "Permission denied. Cannot write to the download location."
            }
            DownloadError::FormatUnavailable(_) => {
                "The requested quality is not available for this video."
            }
            DownloadError::NoFormats(_) => "No suitable video format found.",
            DownloadError::Cancelled(_) => "Download was cancelled.",
            DownloadError::Failed(m) => m,
        }
    }

    /// Hints a UI can show next to [`DownloadError::user_message`]
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            DownloadError::Unavailable(_) => &[
                "The video may have been removed or made private",
                "Check if the URL is correct",
                "Try a different video or source",
            ],
            DownloadError::PrivateContent(_) => &[
                "Private videos require authentication",
                "You may need to log in with appropriate credentials",
            ],
            DownloadError::AgeRestricted(_) => &[
                "Age-restricted content requires authentication",
                "Configure a cookies file from a logged-in browser session",
            ],
            DownloadError::GeoRestricted(_) => &[
                "The content may be geo-blocked in your country",
                "Look for alternative sources of the same content",
            ],
            DownloadError::Authentication(_) => &[
                "Check your login credentials",
                "Ensure your account has access to this content",
            ],
            DownloadError::RateLimited(_) => &[
                "Wait a few minutes before trying again",
                "Reduce the number of concurrent downloads",
            ],
            DownloadError::Network(_) => &[
                "Check your internet connection",
                "Try again in a few moments",
            ],
            DownloadError::Timeout(_) => &[
                "Check your internet connection speed",
                "Consider downloading a lower quality version",
            ],
            DownloadError::InsufficientSpace(_) => &[
                "Free up space on your download drive",
                "Choose a different download location",
            ],
            DownloadError::PermissionDenied(_) => &[
                "Check folder permissions",
                "Try a different download location",
            ],
            DownloadError::FormatUnavailable(_) => &[
                "Try a different quality setting",
                "Use 'best' quality to get the highest available",
            ],
            DownloadError::NoFormats(_) => &[
                "Try downloading audio only",
                "Check if the video is still available",
            ],
            DownloadError::Cancelled(_) => &["You can restart the download anytime"],
            DownloadError::Failed(_) => &[
                "Check the URL and try again",
                "Verify your internet connection",
            ],
        }
    }
}
