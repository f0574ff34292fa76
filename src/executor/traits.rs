//! The download executor boundary

use crate::types::{DownloadOptions, DownloadOutcome, MediaInfo};
use async_trait::async_trait;

/// Performs the actual fetch for one URL
///
/// The queue and the batch runner treat the executor as opaque: a call either
/// returns an outcome or an error, and an error is turned into a failed result
/// record without stopping the run. Executors are shared between worker tasks,
/// so implementations must be `Send + Sync`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use videomilker::{DownloadExecutor, DownloadOptions, DownloadOutcome, MediaInfo};
///
/// struct Pretend;
///
/// #[async_trait]
/// impl DownloadExecutor for Pretend {
///     async fn download(
///         &self,
///         url: &str,
///         _options: &DownloadOptions,
///     ) -> videomilker::Result<DownloadOutcome> {
///         Ok(DownloadOutcome {
///             filename: Some(format!("{}.mp4", url.len())),
///             ..Default::default()
///         })
///     }
///
///     async fn probe(&self, _url: &str) -> videomilker::Result<MediaInfo> {
///         Ok(MediaInfo::default())
///     }
///
///     fn name(&self) -> &'static str {
///         "pretend"
///     }
/// }
/// ```
#[async_trait]
pub trait DownloadExecutor: Send + Sync {
    /// Download one URL with the given (already merged) options
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> crate::Result<DownloadOutcome>;

    /// Fetch metadata for one URL without downloading it
    async fn probe(&self, url: &str) -> crate::Result<MediaInfo>;

    /// Name of the implementation, for logging
    fn name(&self) -> &'static str;
}
