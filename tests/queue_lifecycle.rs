//! Download queue lifecycle through the public API

mod common;

use common::{ScriptedExecutor, test_config, test_urls, wait_for_event, wait_for_queue_status};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use videomilker::{DownloadOptions, DownloadQueue, Event, QueueStatus};

fn queue_over(executor: Arc<ScriptedExecutor>) -> (DownloadQueue, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let queue = DownloadQueue::new(executor, &test_config(dir.path()));
    (queue, dir)
}

#[tokio::test]
async fn test_fifo_processing_to_completion() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (queue, _dir) = queue_over(executor.clone());
    let urls = test_urls("fifo", 15);
    queue.add_urls(urls.clone()).await;

    queue.start_processing(DownloadOptions::default()).await.unwrap();
    queue.wait_until_finished().await;

    let results = queue.get_results().await;
    let processed: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(processed, urls);
    assert_eq!(executor.calls(), urls);

    let status = queue.get_queue_status().await;
    assert_eq!(status.status, QueueStatus::Completed);
    assert_eq!(status.processed, 15);
    assert_eq!(status.remaining, 0);
    assert!(status.end_time.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_holds_until_resume() {
    let executor = Arc::new(ScriptedExecutor::new().with_delay(Duration::from_millis(30)));
    let (queue, _dir) = queue_over(executor.clone());
    let mut events = queue.subscribe();
    queue.add_urls(test_urls("pause", 10)).await;

    queue.start_processing(DownloadOptions::default()).await.unwrap();
    let second = wait_for_event(&mut events, Duration::from_secs(5), |e| {
        matches!(e, Event::ItemCompleted { index: 1, .. })
    })
    .await;
    assert!(second.is_some(), "second item never completed");
    queue.pause_processing().await.unwrap();

    // An item claimed just before the pause may still finish
    tokio::time::sleep(Duration::from_millis(150)).await;
    let held = executor.finished();
    assert!(held <= 3, "{held} items finished after pausing at 2");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(executor.finished(), held, "items completed while paused");
    assert_eq!(queue.get_queue_status().await.status, QueueStatus::Paused);

    queue.resume_processing().await.unwrap();
    assert!(wait_for_queue_status(&queue, QueueStatus::Completed, Duration::from_secs(5)).await);
    assert_eq!(queue.get_results().await.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_mid_run() {
    let executor = Arc::new(ScriptedExecutor::new().with_delay(Duration::from_millis(10)));
    let (queue, _dir) = queue_over(executor.clone());
    queue.add_urls(test_urls("stop", 100)).await;

    queue.start_processing(DownloadOptions::default()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    queue.stop_processing().await.unwrap();
    queue.wait_until_finished().await;

    let results = queue.get_results().await;
    assert!(results.len() < 100, "stop did not interrupt the run");
    assert_eq!(queue.get_queue_status().await.status, QueueStatus::Stopped);

    let calls = executor.calls();
    let unique: HashSet<_> = calls.iter().collect();
    assert_eq!(unique.len(), calls.len(), "an item was processed twice");
    assert_eq!(calls.len(), results.len());
}

#[tokio::test]
async fn test_retry_failed_appends_new_attempts() {
    let urls = test_urls("qretry", 10);
    let executor = Arc::new(ScriptedExecutor::new().failing([
        urls[2].clone(),
        urls[3].clone(),
        urls[7].clone(),
    ]));
    let (queue, _dir) = queue_over(executor.clone());
    queue.add_urls(urls.clone()).await;

    queue.start_processing(DownloadOptions::default()).await.unwrap();
    queue.wait_until_finished().await;
    assert_eq!(queue.get_failed_downloads().await.len(), 3);

    let retried = queue
        .retry_failed_downloads(DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(retried, 3);
    queue.wait_until_finished().await;

    let results = queue.get_results().await;
    assert_eq!(results.len(), 13);
    let retry_urls: Vec<_> = results[10..].iter().map(|r| r.url.clone()).collect();
    assert_eq!(retry_urls, vec![urls[2].clone(), urls[3].clone(), urls[7].clone()]);

    // Original failures stay in the audit trail, older than their retries
    for url in &retry_urls {
        let attempts: Vec<_> = results.iter().filter(|r| &r.url == url).collect();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].timestamp <= attempts[1].timestamp);
    }
}
