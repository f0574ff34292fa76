//! Queue lifecycle control: start, pause, resume, stop, retry.

use super::{DownloadQueue, RunControl, latest_per_url, worker};
use crate::error::{QueueError, Result};
use crate::types::{DownloadOptions, Event, ItemStatus, QueueStatus};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

impl DownloadQueue {
    /// Start the background worker
    ///
    /// `options` are merged over the configured defaults for this run. Calling
    /// this while the queue is running or paused is a no-op. Starting again
    /// after a stop or completion processes whatever items are still waiting.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] when no item is waiting.
    pub async fn start_processing(&self, options: DownloadOptions) -> Result<()> {
        let mut worker = self.inner.worker.lock().await;

        // A stopped worker may still be finishing its in-flight item
        if let Some(previous) = worker.take()
            && !previous.is_finished()
        {
            let status = self.inner.state.lock().await.status;
            if status.is_active() {
                *worker = Some(previous);
                tracing::debug!("queue already running, start ignored");
                return Ok(());
            }
            if let Err(e) = previous.await {
                tracing::error!(error = %e, "previous queue worker ended abnormally");
            }
        }

        let mut state = self.inner.state.lock().await;
        if state.status.is_active() {
            tracing::debug!("queue already running, start ignored");
            return Ok(());
        }

        let pending = state.pending_count();
        if pending == 0 {
            return Err(QueueError::Empty.into());
        }

        let cancel = CancellationToken::new();
        let (pause_tx, pause_rx) = watch::channel(false);
        state.status = QueueStatus::Running;
        state.start_time = Some(Utc::now());
        state.end_time = None;
        state.control = Some(RunControl {
            cancel: cancel.clone(),
            pause_tx,
        });
        let epoch = state.epoch;
        drop(state);

        let options = Arc::new(options.merged_over(&self.inner.defaults));
        tracing::info!(pending, "queue processing started");
        self.inner.emit_event(Event::QueueStarted { pending });

        *worker = Some(tokio::spawn(worker::run(
            Arc::clone(&self.inner),
            options,
            cancel,
            pause_rx,
            epoch,
        )));
        Ok(())
    }

    /// Pause before the next item
    ///
    /// An in-flight download is not interrupted. Pausing a paused queue is a
    /// no-op.
    pub async fn pause_processing(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        match state.status {
            QueueStatus::Paused => Ok(()),
            QueueStatus::Running => {
                state.status = QueueStatus::Paused;
                if let Some(control) = &state.control {
                    control.pause_tx.send_replace(true);
                }
                drop(state);

                tracing::info!("queue paused");
                self.inner.emit_event(Event::QueuePaused);
                Ok(())
            }
            _ => Err(state.invalid("pause")),
        }
    }

    /// Resume a paused queue; resuming a running queue is a no-op
    pub async fn resume_processing(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        match state.status {
            QueueStatus::Running => Ok(()),
            QueueStatus::Paused => {
                state.status = QueueStatus::Running;
                if let Some(control) = &state.control {
                    control.pause_tx.send_replace(false);
                }
                drop(state);

                tracing::info!("queue resumed");
                self.inner.emit_event(Event::QueueResumed);
                Ok(())
            }
            _ => Err(state.invalid("resume")),
        }
    }

    /// Stop the run after the current item
    ///
    /// Every item the worker has not claimed yet is marked cancelled. The
    /// in-flight download, if any, still completes and records its result.
    /// Stopping a stopped queue is a no-op.
    pub async fn stop_processing(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        match state.status {
            QueueStatus::Stopped => Ok(()),
            QueueStatus::Running | QueueStatus::Paused => {
                state.status = QueueStatus::Stopped;
                state.end_time = Some(Utc::now());
                if let Some(control) = state.control.take() {
                    control.cancel.cancel();
                }

                let cursor = state.cursor;
                for item in state.items.iter_mut().skip(cursor) {
                    if item.status == ItemStatus::Queued {
                        item.status = ItemStatus::Cancelled;
                    }
                }
                let processed = state.results.len();
                drop(state);

                tracing::info!(processed, "queue stopped");
                self.inner.emit_event(Event::QueueStopped { processed });
                Ok(())
            }
            _ => Err(state.invalid("stop")),
        }
    }

    /// Re-enqueue every URL whose latest result failed, then restart
    ///
    /// Retried URLs are appended as new items (flagged `is_retry`); their
    /// earlier failed records stay in the results. Returns the number of URLs
    /// re-enqueued; with nothing to retry the queue is left untouched.
    ///
    /// # Errors
    ///
    /// Rejected while the queue is running or paused.
    pub async fn retry_failed_downloads(&self, options: DownloadOptions) -> Result<usize> {
        let count = {
            let mut state = self.inner.state.lock().await;
            if state.status.is_active() {
                return Err(state.invalid("retry"));
            }

            let cursor = state.cursor;
            let failed: Vec<String> = latest_per_url(&state.results)
                .into_iter()
                .filter(|r| r.is_failed())
                .map(|r| r.url)
                .filter(|url| {
                    !state.items[cursor..]
                        .iter()
                        .any(|item| item.status == ItemStatus::Queued && &item.url == url)
                })
                .collect();

            for url in &failed {
                state.push_item(url.clone(), true);
            }
            failed.len()
        };

        if count == 0 {
            tracing::debug!("no failed downloads to retry");
            return Ok(0);
        }

        tracing::info!(count, "retrying failed downloads");
        self.start_processing(options).await?;
        Ok(count)
    }

    /// Wait for the current worker, if any, to exit
    ///
    /// Returns immediately when nothing is running. A paused queue keeps its
    /// worker alive, so this only returns once it is resumed and finishes or
    /// is stopped.
    pub async fn wait_until_finished(&self) {
        let handle = self.inner.worker.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "queue worker ended abnormally");
        }
    }
}
