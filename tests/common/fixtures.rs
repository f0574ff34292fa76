//! Scripted download executor for exercising the public API

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use videomilker::{DownloadError, DownloadExecutor, DownloadOptions, DownloadOutcome, MediaInfo};

/// Executor that sleeps, fails a fixed URL set and tracks concurrency
#[derive(Default)]
pub struct ScriptedExecutor {
    delay: Duration,
    failing: HashSet<String>,
    active: AtomicUsize,
    high_water: AtomicUsize,
    completed: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every listed URL fails with "Video unavailable"
    pub fn failing<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Highest number of simultaneously active downloads observed
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Downloads that have returned so far
    pub fn finished(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// URLs passed to `download`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl DownloadExecutor for ScriptedExecutor {
    async fn download(
        &self,
        url: &str,
        _options: &DownloadOptions,
    ) -> videomilker::Result<DownloadOutcome> {
        self.calls.lock().expect("calls lock").push(url.to_string());
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now_active, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(url) {
            return Err(DownloadError::from_message(format!("ERROR: Video unavailable: {url}")).into());
        }
        Ok(DownloadOutcome {
            filename: Some(format!("{}.mp4", url.rsplit('/').next().unwrap_or("video"))),
            size: Some(1024 * 1024),
            title: Some(format!("Video {url}")),
        })
    }

    async fn probe(&self, url: &str) -> videomilker::Result<MediaInfo> {
        if self.failing.contains(url) {
            return Err(DownloadError::from_message("ERROR: Private video").into());
        }
        Ok(MediaInfo {
            title: Some(format!("Video {url}")),
            filesize: Some(1024 * 1024),
            duration_secs: Some(30.0),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
