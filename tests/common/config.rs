//! Test configuration helpers

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use videomilker::{BatchProcessor, Config, DownloadExecutor};

/// Config rooted in `dir`: no day folders, no history, no retry delays
pub fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = dir.join("downloads");
    config.download.create_day_folders = false;
    config.history.enabled = false;
    config.history.database_path = dir.join("history.db");
    config.retry.max_attempts = 0;
    config.retry.initial_delay = Duration::from_millis(1);
    config.tools.search_path = false;
    config
}

/// Batch processor over `executor` in a fresh temp directory
pub async fn create_processor(
    executor: Arc<dyn DownloadExecutor>,
    configure: impl FnOnce(&mut Config),
) -> (BatchProcessor, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = test_config(dir.path());
    configure(&mut config);
    let processor = BatchProcessor::with_executor(config, executor)
        .await
        .expect("processor");
    (processor, dir)
}

/// `n` distinct URLs under `prefix`
pub fn test_urls(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://videos.test/{prefix}/{i}"))
        .collect()
}
