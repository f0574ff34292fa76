//! The single background worker that drains the queue in order.

use super::QueueInner;
use crate::executor::download_to_result;
use crate::types::{DownloadOptions, DownloadResult, Event, ItemStatus, QueueStatus, ResultStatus};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What the worker does next, decided under the state lock
enum Step {
    /// Claimed the item at `index`
    Run { index: usize, url: String },
    /// Queue is paused; wait for the gate to open
    Wait,
    /// Reached the end of the list
    Finished { successful: usize, failed: usize },
    /// Stopped or cleared
    Exit,
}

pub(super) async fn run(
    inner: Arc<QueueInner>,
    options: Arc<DownloadOptions>,
    cancel: CancellationToken,
    mut pause_rx: watch::Receiver<bool>,
    epoch: u64,
) {
    loop {
        match next_step(&inner, &cancel, epoch).await {
            Step::Run { index, url } => {
                inner.emit_event(Event::ItemStarted {
                    url: url.clone(),
                    index,
                    worker_id: None,
                });

                let result = download_to_result(
                    Arc::clone(&inner.executor),
                    inner.retry.clone(),
                    url,
                    Arc::clone(&options),
                )
                .await
                .with_index(index);

                record(&inner, index, result, epoch).await;
            }
            Step::Wait => {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    changed = pause_rx.wait_for(|paused| !*paused) => {
                        if changed.is_err() {
                            // Run control dropped
                            break;
                        }
                    }
                }
            }
            Step::Finished { successful, failed } => {
                tracing::info!(successful, failed, "queue processing completed");
                inner.emit_event(Event::QueueCompleted { successful, failed });
                break;
            }
            Step::Exit => break,
        }
    }
}

async fn next_step(inner: &QueueInner, cancel: &CancellationToken, epoch: u64) -> Step {
    let mut state = inner.state.lock().await;
    if cancel.is_cancelled() || state.epoch != epoch {
        return Step::Exit;
    }

    match state.status {
        QueueStatus::Paused => Step::Wait,
        QueueStatus::Running => {
            // Skip items cancelled by an earlier stop
            while state.cursor < state.items.len()
                && state.items[state.cursor].status != ItemStatus::Queued
            {
                state.cursor += 1;
            }

            if state.cursor == state.items.len() {
                state.status = QueueStatus::Completed;
                state.end_time = Some(Utc::now());
                state.current = None;
                state.control = None;
                return Step::Finished {
                    successful: state.count_results(ResultStatus::Completed),
                    failed: state.count_results(ResultStatus::Failed),
                };
            }

            let index = state.cursor;
            state.cursor += 1;
            state.current = Some(index);
            let item = &mut state.items[index];
            item.status = ItemStatus::Downloading;
            Step::Run {
                index,
                url: item.url.clone(),
            }
        }
        QueueStatus::Idle | QueueStatus::Stopped | QueueStatus::Completed => Step::Exit,
    }
}

async fn record(inner: &QueueInner, index: usize, result: DownloadResult, epoch: u64) {
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

    {
        let mut state = inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!(url = %result.url, "queue cleared during download, dropping result");
            return;
        }

        if let Some(item) = state.items.get_mut(index) {
            item.status = match result.status {
                ResultStatus::Completed => ItemStatus::Completed,
                ResultStatus::Failed => ItemStatus::Failed,
                ResultStatus::Cancelled => ItemStatus::Cancelled,
            };
            item.result = Some(result.clone());
        }
        state.results.push(result);
        if state.current == Some(index) {
            state.current = None;
        }
    }

    inner.emit_event(event);
}
