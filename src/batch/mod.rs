//! Batch orchestration
//!
//! [`BatchProcessor`] is the caller-facing entry point. It owns the
//! sequential [`DownloadQueue`] and the concurrent [`BatchRunner`], both
//! publishing on one event channel, and adds:
//!
//! - run logs written after every batch (see [`runlog`])
//! - optional download history in SQLite
//! - batch file handling: loading, saving, validation, templates
//! - size estimation and statistics
//!
//! Persistence is best-effort. A failed log write or history insert is logged
//! and never changes the results handed back to the caller.

mod files;
pub mod runlog;

pub use files::{create_batch_template, load_urls_from_file, parse_urls, save_urls_to_file};

use crate::config::{Config, day_folder_name};
use crate::db::{Database, NewHistoryEntry};
use crate::executor::{DownloadExecutor, executor_from_config};
use crate::queue::DownloadQueue;
use crate::runner::BatchRunner;
use crate::types::{
    BatchFileReport, BatchStatistics, DownloadOptions, DownloadResult, Event, SizeEstimate,
    SizeEstimateEntry,
};
use crate::validation::{BasicUrlValidator, UrlValidator, partition_urls};
use crate::Result;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Subfolder of the download directory used for batch output
pub const BATCH_FOLDER_NAME: &str = "batch_downloads";

/// Caller-facing batch API
pub struct BatchProcessor {
    config: Config,
    executor: Arc<dyn DownloadExecutor>,
    queue: DownloadQueue,
    runner: BatchRunner,
    validator: Arc<dyn UrlValidator>,
    history: Option<Database>,
    event_tx: broadcast::Sender<Event>,
}

impl BatchProcessor {
    /// Build a processor using the executor selected by `config.tools`
    pub async fn new(config: Config) -> Result<Self> {
        let executor = executor_from_config(&config);
        Self::with_executor(config, executor).await
    }

    /// Build a processor around a specific executor
    ///
    /// Validates the configuration and opens the history database when
    /// history is enabled.
    pub async fn with_executor(config: Config, executor: Arc<dyn DownloadExecutor>) -> Result<Self> {
        config.validate()?;

        let history = if config.history.enabled {
            Some(Database::new(&config.history.database_path).await?)
        } else {
            None
        };

        let (event_tx, _rx) = broadcast::channel(1000);
        let queue = DownloadQueue::with_event_sender(Arc::clone(&executor), &config, event_tx.clone());
        let runner = BatchRunner::with_event_sender(Arc::clone(&executor), &config, event_tx.clone());

        Ok(Self {
            config,
            executor,
            queue,
            runner,
            validator: Arc::new(BasicUrlValidator),
            history,
            event_tx,
        })
    }

    /// Replace the URL validator
    pub fn with_validator(mut self, validator: Arc<dyn UrlValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// The sequential, pausable queue sharing this processor's executor
    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// History store, when enabled
    pub fn history(&self) -> Option<&Database> {
        self.history.as_ref()
    }

    /// Subscribe to queue and batch events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Folder for batch output: `download_dir[/DD]/batch_downloads`
    pub fn batch_folder(&self) -> PathBuf {
        let download = &self.config.download;
        let base = if download.create_day_folders {
            download.download_dir.join(day_folder_name())
        } else {
            download.download_dir.clone()
        };
        base.join(BATCH_FOLDER_NAME)
    }

    fn log_dir(&self) -> PathBuf {
        self.config
            .batch
            .log_dir
            .clone()
            .unwrap_or_else(|| self.batch_folder())
    }

    /// Download every URL with bounded concurrency, then persist the run
    ///
    /// Always returns one record per URL. The run log and history rows are
    /// written afterwards; their failures are only logged.
    pub async fn process_batch(
        &self,
        urls: &[String],
        options: DownloadOptions,
    ) -> Vec<DownloadResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let results = self.runner.run(urls, None, options).await;

        if self.config.batch.save_logs {
            match runlog::write_run_log(&self.log_dir(), urls, &results).await {
                Ok(path) => self.emit_event(Event::RunLogSaved { path }),
                Err(e) => tracing::warn!(error = %e, "failed to write run log"),
            }
        }
        self.record_history(&results).await;

        results
    }

    /// Drop URLs that fail validation, then run [`Self::process_batch`]
    pub async fn process_batch_with_validation(
        &self,
        urls: &[String],
        options: DownloadOptions,
    ) -> Vec<DownloadResult> {
        let (valid, invalid) = partition_urls(self.validator.as_ref(), urls.iter().cloned());
        if !invalid.is_empty() {
            tracing::warn!(
                invalid = invalid.len(),
                valid = valid.len(),
                "skipping invalid URLs"
            );
            for url in &invalid {
                tracing::debug!(url = %url, "invalid URL skipped");
            }
        }
        self.process_batch(&valid, options).await
    }

    /// Partition a batch file's URLs into valid and invalid; the file is not modified
    pub async fn validate_batch_file(&self, path: impl AsRef<Path>) -> Result<BatchFileReport> {
        let urls = load_urls_from_file(path).await?;
        let total_urls = urls.len();
        let (valid, invalid) = partition_urls(self.validator.as_ref(), urls);

        Ok(BatchFileReport {
            total_urls,
            valid_urls: valid.len(),
            invalid_urls: invalid.len(),
            is_valid: invalid.is_empty(),
            valid_url_list: valid,
            invalid_url_list: invalid,
        })
    }

    /// Best-effort expected size of a batch
    ///
    /// Probes run with the configured concurrency; entries keep input order.
    /// A failed probe contributes zero bytes and the title "Unknown".
    pub async fn estimate_batch_size(&self, urls: &[String]) -> SizeEstimate {
        let limit = self.config.download.max_concurrent.max(1);

        let entries: Vec<SizeEstimateEntry> = futures::stream::iter(urls.iter().cloned())
            .map(|url| {
                let executor = Arc::clone(&self.executor);
                async move {
                    match executor.probe(&url).await {
                        Ok(info) => SizeEstimateEntry {
                            title: info.title.unwrap_or_else(|| "Unknown".to_string()),
                            size: info.filesize.unwrap_or(0),
                            url,
                        },
                        Err(e) => {
                            tracing::debug!(url = %url, error = %e, "size probe failed");
                            SizeEstimateEntry {
                                url,
                                title: "Unknown".to_string(),
                                size: 0,
                            }
                        }
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await;

        SizeEstimate {
            total_size_bytes: entries.iter().map(|e| e.size).sum(),
            url_count: entries.len(),
            entries,
        }
    }

    /// Aggregate counts, success rate and total size
    pub fn get_batch_statistics(results: &[DownloadResult]) -> BatchStatistics {
        BatchStatistics::from_results(results)
    }

    /// Re-run every URL with a failed record in `results`
    ///
    /// The submitted list is [`failed_urls`], not the failed records
    /// themselves: a URL with several failed records (for example the original
    /// attempt and an earlier retry) is submitted once, in first-failure order.
    /// The returned results therefore hold one record per distinct failed URL
    /// and may be shorter than the number of failed records passed in.
    pub async fn retry_failed_downloads(
        &self,
        results: &[DownloadResult],
        options: DownloadOptions,
    ) -> Vec<DownloadResult> {
        let urls = failed_urls(results);
        if urls.is_empty() {
            tracing::info!("no failed downloads to retry");
            return Vec::new();
        }

        tracing::info!(count = urls.len(), "retrying failed downloads");
        self.process_batch(&urls, options).await
    }

    async fn record_history(&self, results: &[DownloadResult]) {
        let Some(db) = &self.history else {
            return;
        };

        for result in results {
            if let Err(e) = db.insert_history(&NewHistoryEntry::from(result)).await {
                tracing::warn!(url = %result.url, error = %e, "failed to record history");
            }
        }

        let history = &self.config.history;
        if history.cleanup_days > 0 {
            let cutoff =
                chrono::Utc::now().timestamp() - i64::from(history.cleanup_days) * 24 * 60 * 60;
            if let Err(e) = db.delete_history_before(cutoff).await {
                tracing::warn!(error = %e, "failed to purge old history");
            }
        }
        if history.max_entries > 0
            && let Err(e) = db.trim_history(history.max_entries).await
        {
            tracing::warn!(error = %e, "failed to trim history");
        }
    }

    /// Close the history database
    pub async fn close(self) {
        if let Some(db) = self.history {
            db.close().await;
        }
    }
}

/// Distinct URLs of failed records, in first-failure order
pub fn failed_urls(results: &[DownloadResult]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    results
        .iter()
        .filter(|r| r.is_failed())
        .filter(|r| seen.insert(r.url.as_str()))
        .map(|r| r.url.clone())
        .collect()
}

#[cfg(test)]
mod tests;
