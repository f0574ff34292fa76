//! Custom test assertions for integration tests

use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;
use videomilker::{DownloadQueue, DownloadResult, Event, QueueStatus};

/// Wait for the first event matching `predicate`
///
/// Returns `None` on timeout or when the channel closes.
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    mut predicate: F,
) -> Option<Event>
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Poll the queue until it reports `status`
pub async fn wait_for_queue_status(queue: &DownloadQueue, status: QueueStatus, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, async {
        while queue.get_queue_status().await.status != status {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// Exactly one record per submitted URL
pub fn assert_one_result_per_url(urls: &[String], results: &[DownloadResult]) {
    assert_eq!(
        results.len(),
        urls.len(),
        "expected {} results, got {}",
        urls.len(),
        results.len()
    );
    let returned: HashSet<_> = results.iter().map(|r| r.url.as_str()).collect();
    let submitted: HashSet<_> = urls.iter().map(String::as_str).collect();
    assert_eq!(returned, submitted, "result URLs differ from submitted URLs");
}
