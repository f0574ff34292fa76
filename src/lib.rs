//! # videomilker
//!
//! Download-orchestration core for `yt-dlp` front ends.
//!
//! The crate never fetches media itself. It schedules work for a
//! [`DownloadExecutor`] (normally [`YtDlpExecutor`]) and collects exactly one
//! result record per attempted URL:
//!
//! - [`DownloadQueue`]: sequential FIFO processing on one background task,
//!   with pause, resume, stop and retry of failed items
//! - [`BatchRunner`]: one-shot processing of a fixed list with at most
//!   `max_concurrent` downloads in flight
//! - [`BatchProcessor`]: the caller-facing entry point; runs batches, writes
//!   JSON run logs, records history, validates and estimates batch files
//!
//! Executor failures never escape: they become failed result records and
//! processing continues with the next URL.
//!
//! ## Quick Start
//!
//! ```no_run
//! use videomilker::{BatchProcessor, Config, DownloadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = BatchProcessor::new(Config::default()).await?;
//!
//!     let mut events = processor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let urls = vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()];
//!     let results = processor
//!         .process_batch_with_validation(&urls, DownloadOptions::default())
//!         .await;
//!     let stats = BatchProcessor::get_batch_statistics(&results);
//!     println!("{}/{} downloaded", stats.successful, stats.total);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch orchestration, run logs and batch files
pub mod batch;
/// Configuration types
pub mod config;
/// Download history persistence
pub mod db;
/// Error types
pub mod error;
/// Download executors
pub mod executor;
/// Sequential download queue
pub mod queue;
/// Retry logic with exponential backoff
pub mod retry;
/// Bounded-concurrency batch runner
pub mod runner;
/// Core types and events
pub mod types;
/// URL pre-flight validation
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use batch::BatchProcessor;
pub use config::{Config, RetryConfig};
pub use db::Database;
pub use error::{DatabaseError, DownloadError, Error, QueueError, Result};
pub use executor::{DownloadExecutor, UnavailableExecutor, YtDlpExecutor, executor_from_config};
pub use queue::DownloadQueue;
pub use runner::{BatchRunner, ResultSink};
pub use types::{
    BatchStatistics, DownloadOptions, DownloadOutcome, DownloadResult, Event, HistoryEntry,
    ItemStatus, MediaInfo, QueueSnapshot, QueueStatus, ResultStatus, WorkItem,
};
pub use validation::{BasicUrlValidator, UrlValidator};

/// Stop a queue cooperatively when the process receives a termination signal.
///
/// Waits for a signal, stops the queue, then waits for its worker to finish
/// the in-flight download. A queue that is not running is left alone.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use videomilker::{Config, DownloadOptions, DownloadQueue, executor_from_config, stop_on_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let queue = DownloadQueue::new(executor_from_config(&config), &config);
///     queue.add_url("https://vimeo.com/76979871").await;
///     queue.start_processing(DownloadOptions::default()).await?;
///
///     tokio::select! {
///         _ = queue.wait_until_finished() => {}
///         result = stop_on_signal(queue.clone()) => result?,
///     }
///     Ok(())
/// }
/// ```
pub async fn stop_on_signal(queue: DownloadQueue) -> Result<()> {
    wait_for_signal().await;

    match queue.stop_processing().await {
        Ok(()) => {}
        // Already finished or never started
        Err(Error::Queue(QueueError::InvalidState { current_state, .. })) => {
            tracing::debug!(state = %current_state, "queue not running, nothing to stop");
        }
        Err(e) => return Err(e),
    }

    queue.wait_until_finished().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "Could not register every signal handler");
            only.recv().await;
            tracing::info!("Received termination signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
