//! Download executors
//!
//! The queue and batch runner never fetch anything themselves. They call a
//! [`DownloadExecutor`], one URL at a time:
//!
//! - [`YtDlpExecutor`]: runs the external `yt-dlp` binary
//! - [`UnavailableExecutor`]: stand-in when no binary is available; every call
//!   fails with [`crate::Error::NotSupported`]
//!
//! Use [`executor_from_config`] to pick one the same way the rest of the
//! library does.

mod parser;
mod traits;
mod unavailable;
mod ytdlp;

pub use parser::{ExitStatus, extract_error_message, parse_download_output, parse_probe_output};
pub use traits::DownloadExecutor;
pub use unavailable::UnavailableExecutor;
pub use ytdlp::{YtDlpExecutor, build_download_args, build_probe_args};

use crate::config::{Config, RetryConfig};
use crate::retry::download_with_retry;
use crate::types::{DownloadOptions, DownloadResult};
use std::sync::Arc;

/// Choose an executor from the tools configuration
///
/// An explicit `tools.ytdlp_path` wins; otherwise PATH is searched when
/// `tools.search_path` is set. Falls back to [`UnavailableExecutor`].
pub fn executor_from_config(config: &Config) -> Arc<dyn DownloadExecutor> {
    let executor: Arc<dyn DownloadExecutor> = if let Some(ref path) = config.tools.ytdlp_path {
        Arc::new(YtDlpExecutor::new(path.clone()))
    } else if config.tools.search_path {
        YtDlpExecutor::from_path()
            .map(|e| Arc::new(e) as Arc<dyn DownloadExecutor>)
            .unwrap_or_else(|| Arc::new(UnavailableExecutor))
    } else {
        Arc::new(UnavailableExecutor)
    };

    tracing::info!(executor = executor.name(), "download executor selected");
    executor
}

/// Download one URL and turn the outcome into a result record
///
/// Transient failures are retried per `retry`. The call runs in its own task so
/// a panicking executor still yields a failed record instead of taking the
/// caller down with it. Never returns an error.
pub(crate) async fn download_to_result(
    executor: Arc<dyn DownloadExecutor>,
    retry: RetryConfig,
    url: String,
    options: Arc<DownloadOptions>,
) -> DownloadResult {
    let task_url = url.clone();
    let task = tokio::spawn(async move {
        download_with_retry(&retry, || executor.download(&task_url, options.as_ref())).await
    });

    match task.await {
        Ok(Ok(outcome)) => DownloadResult::completed(url, outcome),
        Ok(Err(e)) => {
            tracing::warn!(url = %url, error = %e, "download failed");
            DownloadResult::failed(url, e)
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "download task aborted");
            DownloadResult::failed(url, format!("download task aborted: {}", e))
        }
    }
}
