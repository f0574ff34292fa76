//! Shared test helpers: a scriptable executor and a ready-to-use config.

use crate::config::Config;
use crate::error::DownloadError;
use crate::executor::DownloadExecutor;
use crate::types::{DownloadOptions, DownloadOutcome, MediaInfo};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Hook = Arc<dyn Fn(usize) -> BoxFuture<'static, ()> + Send + Sync>;

/// Executor stub with configurable latency, failures and instrumentation
#[derive(Default)]
pub(crate) struct StubExecutor {
    delay: Duration,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    sizes: HashMap<String, u64>,
    hook: Option<Hook>,
    active: AtomicUsize,
    high_water: AtomicUsize,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    seen_options: Mutex<Vec<DownloadOptions>>,
}

impl StubExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// URLs in this set fail with a non-retryable error
    pub(crate) fn failing<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = urls.into_iter().map(Into::into).collect();
        self
    }

    /// URLs in this set make `download` panic
    pub(crate) fn panicking<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.panicking = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Sizes reported by downloads and probes
    pub(crate) fn with_size(mut self, url: &str, size: u64) -> Self {
        self.sizes.insert(url.to_string(), size);
        self
    }

    /// Run `hook(call_number)` (1-based) inside each download, before it returns
    pub(crate) fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub(crate) fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn last_options(&self) -> Option<DownloadOptions> {
        self.seen_options.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DownloadExecutor for StubExecutor {
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> crate::Result<DownloadOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now_active, Ordering::SeqCst);
        self.seen.lock().unwrap().push(url.to_string());
        self.seen_options.lock().unwrap().push(options.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(hook) = &self.hook {
            hook(call).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(url) {
            panic!("executor blew up on {url}");
        }
        if self.failing.contains(url) {
            return Err(DownloadError::from_message(format!("ERROR: Video unavailable: {url}")).into());
        }
        Ok(DownloadOutcome {
            filename: Some(format!("{}.mp4", url.rsplit('/').next().unwrap_or("video"))),
            size: self.sizes.get(url).copied(),
            title: Some(format!("Title of {url}")),
        })
    }

    async fn probe(&self, url: &str) -> crate::Result<MediaInfo> {
        if self.failing.contains(url) {
            return Err(DownloadError::from_message("ERROR: Private video").into());
        }
        Ok(MediaInfo {
            title: Some(format!("Title of {url}")),
            filesize: self.sizes.get(url).copied(),
            duration_secs: Some(60.0),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Config rooted in `dir` with fast retries and no history
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = dir.join("downloads");
    config.download.create_day_folders = false;
    config.history.enabled = false;
    config.history.database_path = dir.join("history.db");
    config.retry.max_attempts = 0;
    config.retry.initial_delay = Duration::from_millis(1);
    config
}

/// `n` distinct URLs
pub(crate) fn urls(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://videos.test/{prefix}/{i}"))
        .collect()
}
