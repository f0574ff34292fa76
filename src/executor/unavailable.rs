//! Executor used when no yt-dlp binary can be found

use super::traits::DownloadExecutor;
use crate::types::{DownloadOptions, DownloadOutcome, MediaInfo};
use async_trait::async_trait;

/// Executor that fails every call with [`crate::Error::NotSupported`]
///
/// Lets a queue or batch run still finish with one failed record per URL
/// instead of refusing to start when yt-dlp is missing.
///
/// ```
/// use videomilker::{DownloadExecutor, DownloadOptions, UnavailableExecutor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let executor = UnavailableExecutor;
/// let result = executor
///     .download("https://example.com/v", &DownloadOptions::default())
///     .await;
/// assert!(matches!(result, Err(videomilker::Error::NotSupported(_))));
/// # }
/// ```
pub struct UnavailableExecutor;

const MISSING_BINARY: &str =
    "downloading requires the yt-dlp binary. Set tools.ytdlp_path or ensure yt-dlp is in PATH.";

#[async_trait]
impl DownloadExecutor for UnavailableExecutor {
    async fn download(
        &self,
        _url: &str,
        _options: &DownloadOptions,
    ) -> crate::Result<DownloadOutcome> {
        Err(crate::Error::NotSupported(MISSING_BINARY.into()))
    }

    async fn probe(&self, _url: &str) -> crate::Result<MediaInfo> {
        Err(crate::Error::NotSupported(MISSING_BINARY.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
