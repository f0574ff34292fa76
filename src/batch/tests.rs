// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::test_helpers::{StubExecutor, test_config, urls};
use crate::types::{DownloadOutcome, ResultStatus};
use std::collections::HashSet;

async fn processor_with(
    stub: StubExecutor,
    configure: impl FnOnce(&mut Config),
) -> (BatchProcessor, Arc<StubExecutor>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    configure(&mut config);
    let stub = Arc::new(stub);
    let processor = BatchProcessor::with_executor(config, stub.clone())
        .await
        .unwrap();
    (processor, stub, dir)
}

fn log_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

// --- process_batch ---

#[tokio::test]
async fn process_batch_returns_one_record_per_url_and_writes_log() {
    let input = urls("batch", 5);
    let (processor, _stub, _dir) =
        processor_with(StubExecutor::new().failing([input[2].clone()]), |_| {}).await;
    let mut events = processor.subscribe();

    let results = processor
        .process_batch(&input, DownloadOptions::default())
        .await;

    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.is_failed()).count(), 1);

    let logs = log_files(&processor.batch_folder());
    assert_eq!(logs.len(), 1);
    let log: crate::types::RunLog =
        serde_json::from_str(&std::fs::read_to_string(&logs[0]).unwrap()).unwrap();
    assert_eq!(log.total_urls, 5);
    assert_eq!(log.successful, 4);
    assert_eq!(log.failed, 1);
    assert_eq!(log.urls, input);
    assert_eq!(log.results.len(), 5);

    let mut saved = None;
    while let Ok(event) = events.try_recv() {
        if let Event::RunLogSaved { path } = event {
            saved = Some(path);
        }
    }
    assert_eq!(saved.as_ref(), Some(&logs[0]));
}

#[tokio::test]
async fn empty_batch_does_nothing() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;

    let results = processor.process_batch(&[], DownloadOptions::default()).await;

    assert!(results.is_empty());
    assert!(stub.calls().is_empty());
    assert!(log_files(&processor.batch_folder()).is_empty());
}

#[tokio::test]
async fn log_write_failure_does_not_fail_the_batch() {
    let (processor, _stub, _dir) = processor_with(StubExecutor::new(), |config| {
        // A log directory below a regular file cannot be created
        let blocker = config.download.download_dir.with_file_name("blocker");
        std::fs::write(&blocker, "x").unwrap();
        config.batch.log_dir = Some(blocker.join("logs"));
    })
    .await;

    let results = processor
        .process_batch(&urls("nolog", 3), DownloadOptions::default())
        .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_completed()));
}

#[tokio::test]
async fn logs_can_be_disabled() {
    let (processor, _stub, _dir) = processor_with(StubExecutor::new(), |config| {
        config.batch.save_logs = false;
    })
    .await;

    processor
        .process_batch(&urls("quiet", 2), DownloadOptions::default())
        .await;

    assert!(log_files(&processor.batch_folder()).is_empty());
}

#[tokio::test]
async fn batch_folder_follows_day_folder_setting() {
    let (processor, _stub, dir) = processor_with(StubExecutor::new(), |_| {}).await;
    assert_eq!(
        processor.batch_folder(),
        dir.path().join("downloads").join(BATCH_FOLDER_NAME)
    );

    let (processor, _stub, dir) = processor_with(StubExecutor::new(), |config| {
        config.download.create_day_folders = true;
    })
    .await;
    let folder = processor.batch_folder();
    assert!(folder.starts_with(dir.path().join("downloads")));
    assert!(folder.ends_with(BATCH_FOLDER_NAME));
    let day = folder.parent().unwrap();
    assert_eq!(day.parent().unwrap(), dir.path().join("downloads"));
    assert_eq!(day.file_name().unwrap().len(), 2);
}

// --- validation ---

#[tokio::test]
async fn validate_batch_file_partitions_without_touching_file() {
    let (processor, _stub, dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let path = dir.path().join("list.txt");
    let content = "# my list\nhttps://a.test/1\nnot a url\n\nftp://b.test/2\nhttps://c.test/3\n";
    std::fs::write(&path, content).unwrap();

    let report = processor.validate_batch_file(&path).await.unwrap();

    assert_eq!(report.total_urls, 4);
    assert_eq!(report.valid_urls, 2);
    assert_eq!(report.invalid_urls, 2);
    assert_eq!(report.valid_url_list, vec!["https://a.test/1", "https://c.test/3"]);
    assert_eq!(report.invalid_url_list, vec!["not a url", "ftp://b.test/2"]);
    assert!(!report.is_valid);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[tokio::test]
async fn invalid_urls_are_skipped_before_processing() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let input = vec![
        "https://a.test/1".to_string(),
        "javascript:alert(1)".to_string(),
        "https://a.test/2".to_string(),
    ];

    let results = processor
        .process_batch_with_validation(&input, DownloadOptions::default())
        .await;

    assert_eq!(results.len(), 2);
    let called: HashSet<_> = stub.calls().into_iter().collect();
    assert_eq!(
        called,
        HashSet::from(["https://a.test/1".to_string(), "https://a.test/2".to_string()])
    );
}

struct RejectAll;

impl UrlValidator for RejectAll {
    fn is_valid(&self, _url: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn custom_validator_is_used() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let processor = processor.with_validator(Arc::new(RejectAll));

    let results = processor
        .process_batch_with_validation(&urls("reject", 3), DownloadOptions::default())
        .await;

    assert!(results.is_empty());
    assert!(stub.calls().is_empty());
}

// --- estimation ---

#[tokio::test]
async fn estimate_sums_sizes_and_tolerates_probe_failures() {
    let input = urls("size", 4);
    let stub = StubExecutor::new()
        .with_size(&input[0], 100)
        .with_size(&input[1], 250)
        .with_size(&input[3], 50)
        .failing([input[2].clone()]);
    let (processor, _stub, _dir) = processor_with(stub, |_| {}).await;

    let estimate = processor.estimate_batch_size(&input).await;

    assert_eq!(estimate.url_count, 4);
    assert_eq!(estimate.total_size_bytes, 400);
    let order: Vec<_> = estimate.entries.iter().map(|e| e.url.clone()).collect();
    assert_eq!(order, input);
    assert_eq!(estimate.entries[2].size, 0);
    assert_eq!(estimate.entries[2].title, "Unknown");
    assert_eq!(estimate.entries[0].title, format!("Title of {}", input[0]));
}

// --- statistics ---

fn completed(url: &str, size: u64) -> DownloadResult {
    DownloadResult::completed(
        url,
        DownloadOutcome {
            filename: None,
            size: Some(size),
            title: None,
        },
    )
}

#[test]
fn statistics_are_pure() {
    let mut results: Vec<_> = (0..7).map(|i| completed(&format!("https://ok/{i}"), 1024)).collect();
    results.extend((0..3).map(|i| DownloadResult::failed(format!("https://bad/{i}"), "boom")));
    let before = results.clone();

    let first = BatchProcessor::get_batch_statistics(&results);
    let second = BatchProcessor::get_batch_statistics(&results);

    assert_eq!(first, second);
    assert_eq!(results, before);
    assert_eq!(first.total, 10);
    assert_eq!(first.successful, 7);
    assert_eq!(first.failed, 3);
    assert_eq!(first.success_rate, 70.0);
    assert_eq!(first.total_size_bytes, 7 * 1024);
}

// --- retry ---

#[test]
fn failed_urls_are_distinct_and_ordered() {
    let results = vec![
        DownloadResult::failed("https://b", "x"),
        completed("https://a", 1),
        DownloadResult::failed("https://c", "x"),
        DownloadResult::failed("https://b", "again"),
    ];

    assert_eq!(failed_urls(&results), vec!["https://b", "https://c"]);
}

#[tokio::test]
async fn retry_submits_exactly_the_failed_urls() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let input = urls("prior", 10);
    let failed: HashSet<_> = [1, 4, 8].iter().map(|&i| input[i].clone()).collect();
    let prior: Vec<_> = input
        .iter()
        .map(|url| {
            if failed.contains(url) {
                DownloadResult::failed(url, "network error")
            } else {
                completed(url, 1)
            }
        })
        .collect();

    let results = processor
        .retry_failed_downloads(&prior, DownloadOptions::default())
        .await;

    let submitted: HashSet<_> = stub.calls().into_iter().collect();
    assert_eq!(submitted, failed);
    assert_eq!(stub.calls().len(), 3);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status == ResultStatus::Completed));
}

#[tokio::test]
async fn retry_resubmits_each_failed_url_once() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let prior = vec![
        DownloadResult::failed("https://a.test/x", "network error"),
        DownloadResult::failed("https://a.test/x", "network error again"),
        DownloadResult::failed("https://a.test/y", "timed out"),
    ];

    let results = processor
        .retry_failed_downloads(&prior, DownloadOptions::default())
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(stub.calls().len(), 2);
}

#[tokio::test]
async fn batch_then_retry_keeps_both_run_logs() {
    let input = urls("twice", 4);
    let (processor, _stub, _dir) =
        processor_with(StubExecutor::new().failing([input[1].clone()]), |_| {}).await;

    let first = processor
        .process_batch(&input, DownloadOptions::default())
        .await;
    let retried = processor
        .retry_failed_downloads(&first, DownloadOptions::default())
        .await;
    assert_eq!(retried.len(), 1);

    let logs = log_files(&processor.batch_folder());
    assert_eq!(logs.len(), 2);
    let mut totals: Vec<usize> = logs
        .iter()
        .map(|path| {
            let log: crate::types::RunLog =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            log.total_urls
        })
        .collect();
    totals.sort_unstable();
    assert_eq!(totals, vec![1, 4]);
}

#[tokio::test]
async fn retry_with_no_failures_runs_nothing() {
    let (processor, stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;

    let results = processor
        .retry_failed_downloads(&[completed("https://a", 1)], DownloadOptions::default())
        .await;

    assert!(results.is_empty());
    assert!(stub.calls().is_empty());
}

// --- history ---

#[tokio::test]
async fn history_records_one_row_per_result() {
    let input = urls("hist", 4);
    let (processor, _stub, _dir) =
        processor_with(StubExecutor::new().failing([input[0].clone()]), |config| {
            config.history.enabled = true;
        })
        .await;

    processor
        .process_batch(&input, DownloadOptions::default())
        .await;

    let db = processor.history().unwrap();
    assert_eq!(db.count_history(None).await.unwrap(), 4);
    assert_eq!(db.count_history(Some(ResultStatus::Failed)).await.unwrap(), 1);

    processor.close().await;
}

#[tokio::test]
async fn history_is_trimmed_to_max_entries() {
    let (processor, _stub, _dir) = processor_with(StubExecutor::new(), |config| {
        config.history.enabled = true;
        config.history.max_entries = 3;
    })
    .await;

    processor
        .process_batch(&urls("trim", 5), DownloadOptions::default())
        .await;

    assert_eq!(processor.history().unwrap().count_history(None).await.unwrap(), 3);
    processor.close().await;
}

#[tokio::test]
async fn disabled_history_opens_no_database() {
    let (processor, _stub, dir) = processor_with(StubExecutor::new(), |_| {}).await;

    processor
        .process_batch(&urls("nohist", 1), DownloadOptions::default())
        .await;

    assert!(processor.history().is_none());
    assert!(!dir.path().join("history.db").exists());
}

// --- queue sharing ---

#[tokio::test]
async fn queue_events_share_the_processor_channel() {
    let (processor, _stub, _dir) = processor_with(StubExecutor::new(), |_| {}).await;
    let mut events = processor.subscribe();

    processor.queue().add_url("https://a.test/q").await;

    match events.try_recv().unwrap() {
        Event::Queued { url } => assert_eq!(url, "https://a.test/q"),
        other => panic!("unexpected event {other:?}"),
    }
}
