//! Sequential download queue with a pause/resume/stop state machine
//!
//! A [`DownloadQueue`] owns an append-only list of work items and processes
//! them strictly in insertion order with a single background worker task.
//! Every read-modify-write of the queue state happens under one mutex, and
//! status snapshots are taken under the same lock.
//!
//! A failing URL never stops the run: the error is recorded as a failed
//! result and the worker moves on to the next item.
//!
//! ```no_run
//! use std::sync::Arc;
//! use videomilker::{Config, DownloadOptions, DownloadQueue, executor_from_config};
//!
//! # #[tokio::main]
//! # async fn main() -> videomilker::Result<()> {
//! let config = Config::default();
//! let queue = DownloadQueue::new(executor_from_config(&config), &config);
//!
//! queue.add_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await;
//! queue.start_processing(DownloadOptions::default()).await?;
//! queue.wait_until_finished().await;
//!
//! let status = queue.get_queue_status().await;
//! println!("{} of {} done", status.processed, status.total_urls);
//! # Ok(())
//! # }
//! ```

mod control;
mod worker;

use crate::config::{Config, RetryConfig};
use crate::error::{Error, QueueError, Result};
use crate::executor::DownloadExecutor;
use crate::types::{
    DownloadOptions, DownloadResult, Event, ItemStatus, QueueSnapshot, QueueStatus, ResultStatus,
    WorkItem,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Handles owned by the current run, dropped when the run ends
struct RunControl {
    cancel: CancellationToken,
    pause_tx: watch::Sender<bool>,
}

/// Mutable queue state, only touched under [`QueueInner::state`]
struct QueueState {
    items: Vec<WorkItem>,
    results: Vec<DownloadResult>,
    cursor: usize,
    status: QueueStatus,
    current: Option<usize>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    control: Option<RunControl>,
    // Bumped by clear_queue so a late result from a previous run is dropped.
    epoch: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            results: Vec::new(),
            cursor: 0,
            status: QueueStatus::Idle,
            current: None,
            start_time: None,
            end_time: None,
            control: None,
            epoch: 0,
        }
    }

    fn contains(&self, url: &str) -> bool {
        self.items.iter().any(|item| item.url == url)
    }

    /// Append a fresh item; a completed queue has pending work again
    fn push_item(&mut self, url: String, is_retry: bool) {
        self.items.push(WorkItem::new(url, is_retry));
        if self.status == QueueStatus::Completed {
            self.status = QueueStatus::Idle;
        }
    }

    fn pending_count(&self) -> usize {
        self.items
            .iter()
            .skip(self.cursor)
            .filter(|item| item.status == ItemStatus::Queued)
            .count()
    }

    fn count_results(&self, status: ResultStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    fn invalid(&self, operation: &str) -> Error {
        QueueError::InvalidState {
            operation: operation.to_string(),
            current_state: self.status.to_string(),
        }
        .into()
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            status: self.status,
            total_urls: self.items.len(),
            processed: self.results.len(),
            successful: self.count_results(ResultStatus::Completed),
            failed: self.count_results(ResultStatus::Failed),
            remaining: self.pending_count(),
            cursor: self.cursor,
            current_url: self
                .current
                .and_then(|i| self.items.get(i))
                .map(|item| item.url.clone()),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    worker: Mutex<Option<JoinHandle<()>>>,
    executor: Arc<dyn DownloadExecutor>,
    defaults: DownloadOptions,
    retry: RetryConfig,
    event_tx: broadcast::Sender<Event>,
}

impl QueueInner {
    fn emit_event(&self, event: Event) {
        // send() only fails without receivers
        self.event_tx.send(event).ok();
    }
}

/// Sequential, pausable, stoppable download queue
///
/// Cloning is cheap; all clones share the same queue.
#[derive(Clone)]
pub struct DownloadQueue {
    inner: Arc<QueueInner>,
}

impl DownloadQueue {
    /// Create an empty queue
    ///
    /// Per-run options passed to [`DownloadQueue::start_processing`] are merged
    /// over `config.download_options()`.
    pub fn new(executor: Arc<dyn DownloadExecutor>, config: &Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_event_sender(executor, config, event_tx)
    }

    /// Create an empty queue that publishes on an existing event channel
    pub fn with_event_sender(
        executor: Arc<dyn DownloadExecutor>,
        config: &Config,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::new()),
                worker: Mutex::new(None),
                executor,
                defaults: config.download_options(),
                retry: config.retry.clone(),
                event_tx,
            }),
        }
    }

    /// Subscribe to queue events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.event_tx.subscribe()
    }

    /// Append a URL unless it is already in the queue
    ///
    /// Returns `true` when the URL was added. Adding while the queue runs is
    /// allowed; the worker picks the new item up in order. Adding to a
    /// completed queue returns it to [`QueueStatus::Idle`].
    pub async fn add_url(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        let mut state = self.inner.state.lock().await;
        if state.contains(&url) {
            tracing::debug!(url = %url, "url already queued, ignoring");
            return false;
        }
        state.push_item(url.clone(), false);
        drop(state);

        self.inner.emit_event(Event::Queued { url });
        true
    }

    /// Append several URLs, skipping duplicates; returns how many were added
    pub async fn add_urls<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let mut added = Vec::new();
        {
            let mut state = self.inner.state.lock().await;
            for url in urls {
                if !state.contains(&url) {
                    state.push_item(url.clone(), false);
                    added.push(url);
                }
            }
        }

        let count = added.len();
        for url in added {
            self.inner.emit_event(Event::Queued { url });
        }
        count
    }

    /// Remove a URL that has not been claimed yet
    ///
    /// Returns `false` when the URL is absent or already claimed by the worker.
    pub async fn remove_url(&self, url: &str) -> bool {
        let mut state = self.inner.state.lock().await;
        let cursor = state.cursor;
        let position = (cursor..state.items.len()).find(|&i| {
            state.items[i].url == url && state.items[i].status == ItemStatus::Queued
        });

        match position {
            Some(index) => {
                state.items.remove(index);
                drop(state);
                self.inner.emit_event(Event::Removed {
                    url: url.to_string(),
                });
                true
            }
            None => false,
        }
    }

    /// Discard all items and results and return to idle
    ///
    /// Rejected while the queue is running or paused; stop it first.
    pub async fn clear_queue(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status.is_active() {
            return Err(state.invalid("clear"));
        }

        let epoch = state.epoch + 1;
        *state = QueueState::new();
        state.epoch = epoch;
        tracing::debug!("queue cleared");
        Ok(())
    }

    /// Snapshot of counts, cursor and timestamps
    pub async fn get_queue_status(&self) -> QueueSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Copy of every result record, in completion order
    pub async fn get_results(&self) -> Vec<DownloadResult> {
        self.inner.state.lock().await.results.clone()
    }

    /// Copy of the failed result records
    pub async fn get_failed_downloads(&self) -> Vec<DownloadResult> {
        self.inner
            .state
            .lock()
            .await
            .results
            .iter()
            .filter(|r| r.is_failed())
            .cloned()
            .collect()
    }

    /// The most recent result for each URL, in order of first appearance
    ///
    /// After a retry the results list holds the original failure and the retry
    /// outcome; this view keeps only the latter.
    pub async fn latest_results(&self) -> Vec<DownloadResult> {
        let state = self.inner.state.lock().await;
        latest_per_url(&state.results)
    }

    /// URLs of every work item, in processing order
    pub async fn urls(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .await
            .items
            .iter()
            .map(|item| item.url.clone())
            .collect()
    }

    /// Copy of every work item
    pub async fn items(&self) -> Vec<WorkItem> {
        self.inner.state.lock().await.items.clone()
    }
}

fn latest_per_url(results: &[DownloadResult]) -> Vec<DownloadResult> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<DownloadResult> = Vec::new();

    for result in results {
        match positions.get(result.url.as_str()) {
            Some(&pos) => latest[pos] = result.clone(),
            None => {
                positions.insert(result.url.as_str(), latest.len());
                latest.push(result.clone());
            }
        }
    }
    latest
}
