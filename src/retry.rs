//! Retry with exponential backoff for transient executor failures
//!
//! The queue worker and the batch runner wrap every executor call in
//! [`download_with_retry`]. Only failures classified as transient (rate
//! limiting, network trouble, timeouts) are retried; everything else fails
//! on the first attempt. An exhausted retry still yields a single error, so
//! each attempt produces exactly one result record.
//!
//! # Example
//!
//! ```no_run
//! use videomilker::retry::{IsRetryable, download_with_retry};
//! use videomilker::config::RetryConfig;
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("flaky")
//!     }
//! }
//!
//! impl IsRetryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() -> Result<(), Flaky> {
//! let config = RetryConfig::default();
//! download_with_retry(&config, || async { Ok::<_, Flaky>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{DownloadError, Error};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or permanent
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for DownloadError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::RateLimited(_) | DownloadError::Network(_) | DownloadError::Timeout(_)
        )
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Download(e) => e.is_retryable(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::Database(_)
            | Error::Sqlx(_)
            | Error::Queue(_)
            | Error::BatchFile { .. }
            | Error::InvalidUrl(_)
            | Error::Serialization(_)
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Other(_) => false,
        }
    }
}

/// Run an async operation, retrying transient failures with exponential backoff
///
/// `config.max_attempts` is the number of retries after the first attempt.
/// Delays start at `initial_delay`, grow by `backoff_multiplier` and are capped
/// at `max_delay`. With `jitter` enabled each delay is stretched by a random
/// factor in `[1, 2]`.
///
/// Returns the first success, or the last error once retries are exhausted
/// or a permanent error is seen.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "download succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "transient download failure, retrying"
                );

                let wait = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };
                tokio::time::sleep(wait).await;

                // Negative or non-finite products fall back to the cap
                let next =
                    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                        .unwrap_or(config.max_delay);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(
                        error = %e,
                        attempts = attempt + 1,
                        "giving up after exhausting retries"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Stretch a delay by a uniform random factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + factor)).unwrap_or(delay)
}
