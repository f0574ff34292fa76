//! JSON run log written after each batch

use crate::types::{DownloadResult, RunLog};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File name for a log written at the current local time
///
/// `attempt` 0 gives `batch_log_<timestamp>.json`; later attempts append
/// `_<attempt>` so runs finishing within the same second keep separate files.
pub fn run_log_file_name(attempt: u32) -> String {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    if attempt == 0 {
        format!("batch_log_{stamp}.json")
    } else {
        format!("batch_log_{stamp}_{attempt}.json")
    }
}

/// Create a log file in `dir` that did not exist before
async fn create_log_file(dir: &Path) -> Result<(PathBuf, tokio::fs::File)> {
    let mut attempt = 0;
    loop {
        let path = dir.join(run_log_file_name(attempt));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write `{timestamp, total_urls, successful, failed, urls, results}` into `dir`
///
/// Returns the path of the written file. An existing log is never overwritten.
pub async fn write_run_log(
    dir: &Path,
    urls: &[String],
    results: &[DownloadResult],
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let log = RunLog::new(urls, results);
    let json = serde_json::to_string_pretty(&log).map_err(Error::Serialization)?;

    let (path, mut file) = create_log_file(dir).await?;
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;

    tracing::info!(
        path = %path.display(),
        total = log.total_urls,
        successful = log.successful,
        failed = log.failed,
        "run log saved"
    );
    Ok(path)
}
