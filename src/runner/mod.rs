//! One-shot batch runner with bounded concurrency
//!
//! [`BatchRunner::run`] processes a fixed URL list with at most
//! `max_concurrent` downloads in flight. A semaphore permit is acquired
//! before each worker task is spawned and released when the task ends, so
//! admission never overshoots the limit.
//!
//! Large lists are split into chunks (see [`plan_chunks`]) that run back to
//! back under the same limit. Chunking only bounds how many tasks exist at
//! once; it never changes which results come back.

mod sink;

pub use sink::ResultSink;

use crate::config::{BatchConfig, Config, RetryConfig};
use crate::executor::{DownloadExecutor, download_to_result};
use crate::types::{DownloadOptions, DownloadResult, Event, ResultStatus};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;

/// Chunk size for a batch of `total` URLs
///
/// `ceil(total / chunk_divisor)` clamped to `[min_chunk_size, max_chunk_size]`.
///
/// ```
/// use videomilker::config::BatchConfig;
/// use videomilker::runner::plan_chunks;
///
/// let config = BatchConfig::default();
/// assert_eq!(plan_chunks(5, &config), 10);
/// assert_eq!(plan_chunks(250, &config), 25);
/// assert_eq!(plan_chunks(10_000, &config), 50);
/// ```
pub fn plan_chunks(total: usize, config: &BatchConfig) -> usize {
    let min = config.min_chunk_size.max(1);
    let max = config.max_chunk_size.max(min);
    total
        .div_ceil(config.chunk_divisor.max(1))
        .clamp(min, max)
}

/// Bounded-concurrency processor for a fixed URL list
pub struct BatchRunner {
    executor: Arc<dyn DownloadExecutor>,
    defaults: DownloadOptions,
    retry: RetryConfig,
    chunking: BatchConfig,
    max_concurrent: usize,
    event_tx: broadcast::Sender<Event>,
}

impl BatchRunner {
    /// Create a runner using the limits and defaults from `config`
    pub fn new(executor: Arc<dyn DownloadExecutor>, config: &Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        Self::with_event_sender(executor, config, event_tx)
    }

    /// Create a runner that publishes on an existing event channel
    pub fn with_event_sender(
        executor: Arc<dyn DownloadExecutor>,
        config: &Config,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            executor,
            defaults: config.download_options(),
            retry: config.retry.clone(),
            chunking: config.batch.clone(),
            max_concurrent: config.download.max_concurrent,
            event_tx,
        }
    }

    /// Subscribe to batch events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Download every URL and return one result per URL
    ///
    /// `max_concurrent` falls back to the configured limit; zero is treated as
    /// one. `options` are merged over the configured defaults. Returns once all
    /// workers have joined. Results come back in completion order; each carries
    /// the input position in `index` and its worker in `worker_id`.
    pub async fn run(
        &self,
        urls: &[String],
        max_concurrent: Option<usize>,
        options: DownloadOptions,
    ) -> Vec<DownloadResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let limit = max_concurrent.unwrap_or(self.max_concurrent).max(1);
        let options = Arc::new(options.merged_over(&self.defaults));
        let chunk_size = plan_chunks(urls.len(), &self.chunking);
        let chunks = urls.len().div_ceil(chunk_size);
        let semaphore = Arc::new(Semaphore::new(limit));
        let sink = Arc::new(ResultSink::new());

        tracing::info!(
            total = urls.len(),
            max_concurrent = limit,
            chunk_size,
            chunks,
            "batch started"
        );
        self.emit_event(Event::BatchStarted {
            total: urls.len(),
            max_concurrent: limit,
        });

        let mut next_worker_id = 0;
        for (chunk, batch) in urls.chunks(chunk_size).enumerate() {
            tracing::debug!(chunk, chunks, size = batch.len(), "starting chunk");
            self.emit_event(Event::BatchChunk {
                chunk,
                chunks,
                size: batch.len(),
            });

            let mut workers = JoinSet::new();
            for (offset, url) in batch.iter().enumerate() {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::error!(error = %e, "admission semaphore closed");
                        break;
                    }
                };

                let index = chunk * chunk_size + offset;
                let worker_id = next_worker_id;
                next_worker_id += 1;

                let executor = Arc::clone(&self.executor);
                let retry = self.retry.clone();
                let options = Arc::clone(&options);
                let sink = Arc::clone(&sink);
                let event_tx = self.event_tx.clone();
                let url = url.clone();

                workers.spawn(async move {
                    let _permit = permit;
                    event_tx
                        .send(Event::ItemStarted {
                            url: url.clone(),
                            index,
                            worker_id: Some(worker_id),
                        })
                        .ok();

                    let result = download_to_result(executor, retry, url, options)
                        .await
                        .with_worker(worker_id)
                        .with_index(index);

                    let event = match result.status {
                        ResultStatus::Completed => Event::ItemCompleted {
                            url: result.url.clone(),
                            index,
                            filename: result.filename.clone(),
                        },
                        _ => Event::ItemFailed {
                            url: result.url.clone(),
                            index,
                            error: result.error.clone().unwrap_or_default(),
                        },
                    };
                    sink.push(result).await;
                    event_tx.send(event).ok();
                });
            }

            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "batch worker ended abnormally");
                }
            }
        }

        let results = sink.drain().await;
        let successful = results.iter().filter(|r| r.is_completed()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();

        tracing::info!(total = results.len(), successful, failed, "batch finished");
        self.emit_event(Event::BatchCompleted {
            total: results.len(),
            successful,
            failed,
        });
        results
    }
}
