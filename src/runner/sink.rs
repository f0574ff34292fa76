//! Shared collection point for worker results

use crate::types::DownloadResult;
use tokio::sync::Mutex;

/// Append-only, task-safe result collection
///
/// Workers push as they finish; the runner drains once every worker has
/// joined, so the drained order is completion order.
#[derive(Debug, Default)]
pub struct ResultSink {
    results: Mutex<Vec<DownloadResult>>,
}

impl ResultSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record
    pub async fn push(&self, result: DownloadResult) {
        self.results.lock().await.push(result);
    }

    /// Take every record collected so far, leaving the sink empty
    pub async fn drain(&self) -> Vec<DownloadResult> {
        std::mem::take(&mut *self.results.lock().await)
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    /// Whether the sink holds no records
    pub async fn is_empty(&self) -> bool {
        self.results.lock().await.is_empty()
    }
}
