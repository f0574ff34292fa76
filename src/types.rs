//! Core types for videomilker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Processing status of a single work item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Waiting to be claimed by a worker
    Queued,
    /// Claimed by a worker, download in flight
    Downloading,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Dropped before it was claimed (queue stopped)
    Cancelled,
}

impl ItemStatus {
    /// Whether the item can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemStatus::Completed | ItemStatus::Failed | ItemStatus::Cancelled
        )
    }
}

/// Outcome tag carried by a [`DownloadResult`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// Download finished
    Completed,
    /// Download failed; `error` holds the reason
    Failed,
    /// Download was cancelled before completing
    Cancelled,
}

impl ResultStatus {
    /// Convert integer status code to ResultStatus
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => ResultStatus::Completed,
            1 => ResultStatus::Failed,
            2 => ResultStatus::Cancelled,
            _ => ResultStatus::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert ResultStatus to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            ResultStatus::Completed => 0,
            ResultStatus::Failed => 1,
            ResultStatus::Cancelled => 2,
        }
    }
}

/// One result record per processed URL attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Outcome of the attempt
    pub status: ResultStatus,
    /// The URL that was processed
    pub url: String,
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
    /// Error message (failed results only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Size of the downloaded file in bytes, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Path of the downloaded file, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Media title reported by the executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Identifier of the batch worker that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<usize>,
    /// Position of the URL in the submitted list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl DownloadResult {
    /// Build a completed record from an executor outcome
    pub fn completed(url: impl Into<String>, outcome: DownloadOutcome) -> Self {
        Self {
            status: ResultStatus::Completed,
            url: url.into(),
            timestamp: Utc::now(),
            error: None,
            size: outcome.size,
            filename: outcome.filename,
            title: outcome.title,
            worker_id: None,
            index: None,
        }
    }

    /// Build a failed record carrying the error text
    pub fn failed(url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            status: ResultStatus::Failed,
            url: url.into(),
            timestamp: Utc::now(),
            error: Some(error.to_string()),
            size: None,
            filename: None,
            title: None,
            worker_id: None,
            index: None,
        }
    }

    /// Tag the record with the worker that produced it
    pub fn with_worker(mut self, worker_id: usize) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Tag the record with the input position of its URL
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// True for completed records
    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }

    /// True for failed records
    pub fn is_failed(&self) -> bool {
        self.status == ResultStatus::Failed
    }
}

/// A single download request tracked by the queue
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// The request target
    pub url: String,
    /// Current processing status
    pub status: ItemStatus,
    /// Result record, set once the item reaches a terminal state
    pub result: Option<DownloadResult>,
    /// Whether this item was appended by a retry of failed downloads
    pub is_retry: bool,
}

impl WorkItem {
    pub(crate) fn new(url: String, is_retry: bool) -> Self {
        Self {
            url,
            status: ItemStatus::Queued,
            result: None,
            is_retry,
        }
    }
}

/// Queue state machine
///
/// ```text
/// idle ──start──▶ running ──pause──▶ paused
///                  │  ▲               │
///                  │  └────resume─────┘
///                  ├──stop (or from paused)──▶ stopped
///                  └──cursor reaches end─────▶ completed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Nothing has run yet (or the queue was cleared)
    Idle,
    /// The worker is processing items
    Running,
    /// The worker waits at the next item boundary
    Paused,
    /// Processing was stopped by the caller
    Stopped,
    /// Every item was processed
    Completed,
}

impl QueueStatus {
    /// Whether a worker is attached (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, QueueStatus::Running | QueueStatus::Paused)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueueStatus::Idle => "idle",
            QueueStatus::Running => "running",
            QueueStatus::Paused => "paused",
            QueueStatus::Stopped => "stopped",
            QueueStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of a queue, taken under the queue lock
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// State machine status
    pub status: QueueStatus,
    /// Number of work items (including retries)
    pub total_urls: usize,
    /// Number of result records
    pub processed: usize,
    /// Completed result records
    pub successful: usize,
    /// Failed result records
    pub failed: usize,
    /// Items still waiting to be claimed
    pub remaining: usize,
    /// Index of the next unclaimed item
    pub cursor: usize,
    /// URL currently being downloaded
    pub current_url: Option<String>,
    /// When the current or last run started
    pub start_time: Option<DateTime<Utc>>,
    /// When the last run ended
    pub end_time: Option<DateTime<Utc>>,
}

impl QueueSnapshot {
    /// Processed share of all items, in percent
    pub fn progress_percent(&self) -> f64 {
        if self.total_urls == 0 {
            0.0
        } else {
            self.processed as f64 / self.total_urls as f64 * 100.0
        }
    }
}

/// Aggregated view of a result list
///
/// Derived on demand from the results, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    /// Number of result records
    pub total: usize,
    /// Completed records
    pub successful: usize,
    /// Failed records
    pub failed: usize,
    /// successful / total, in percent (0 for an empty list)
    pub success_rate: f64,
    /// Sum of known sizes of completed records
    pub total_size_bytes: u64,
    /// `total_size_bytes` in MiB
    pub total_size_mb: f64,
}

impl BatchStatistics {
    /// Aggregate a result list
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.is_completed()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        let total_size_bytes = results
            .iter()
            .filter(|r| r.is_completed())
            .filter_map(|r| r.size)
            .sum::<u64>();

        Self {
            total,
            successful,
            failed,
            success_rate: if total > 0 {
                successful as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            total_size_bytes,
            total_size_mb: total_size_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

/// Options handed to the download executor
///
/// Every field is optional so a per-run value can be layered over the
/// configured defaults with [`DownloadOptions::merged_over`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Output path template (yt-dlp `-o`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_template: Option<String>,
    /// Format selector (e.g. "best", "bestvideo+bestaudio")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Preferred container for merged output (e.g. "mp4")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_output_format: Option<String>,
    /// Retries per download
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Retries per fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_retries: Option<u32>,
    /// Socket timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_timeout: Option<u64>,
    /// Seconds to sleep between retries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_sleep: Option<u64>,
    /// Resume partially downloaded files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_download: Option<bool>,
    /// Restrict filenames to ASCII
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_filenames: Option<bool>,
    /// Write the thumbnail next to the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_thumbnail: Option<bool>,
    /// Write the description next to the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_description: Option<bool>,
    /// Write the info JSON next to the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_info_json: Option<bool>,
    /// Download subtitles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_subtitles: Option<bool>,
    /// Extract audio track only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_audio: Option<bool>,
    /// Audio format used with `extract_audio`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
    /// Audio quality, 0 (best) to 10 (worst)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<u8>,
    /// Embed subtitles into the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_subs: Option<bool>,
    /// Embed the thumbnail as cover art
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_thumbnail: Option<bool>,
    /// Embed metadata tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_metadata: Option<bool>,
    /// Subtitle conversion target (e.g. "srt")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_subs: Option<String>,
    /// Split the output by chapters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_chapters: Option<bool>,
    /// SponsorBlock categories to mark as chapters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsorblock_mark: Option<Vec<String>>,
    /// SponsorBlock categories to cut out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsorblock_remove: Option<Vec<String>>,
    /// Proxy URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Proxy used only for geo verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_verification_proxy: Option<String>,
    /// Netscape cookies file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,
    /// Client to impersonate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonate: Option<String>,
    /// Force IPv4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_ipv4: Option<bool>,
    /// Force IPv6
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_ipv6: Option<bool>,
    /// Skip TLS certificate validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_check_certificates: Option<bool>,
    /// Extra HTTP headers as "Name:Value"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_headers: Option<Vec<String>>,
    /// Raw arguments appended verbatim to the executor command line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl DownloadOptions {
    /// Layer `self` over `defaults`: any field set here wins
    ///
    /// `extra_args` are concatenated, defaults first.
    pub fn merged_over(self, defaults: &DownloadOptions) -> DownloadOptions {
        let defaults = defaults.clone();
        let mut extra_args = defaults.extra_args;
        extra_args.extend(self.extra_args);

        DownloadOptions {
            output_template: self.output_template.or(defaults.output_template),
            format: self.format.or(defaults.format),
            merge_output_format: self.merge_output_format.or(defaults.merge_output_format),
            retries: self.retries.or(defaults.retries),
            fragment_retries: self.fragment_retries.or(defaults.fragment_retries),
            socket_timeout: self.socket_timeout.or(defaults.socket_timeout),
            retry_sleep: self.retry_sleep.or(defaults.retry_sleep),
            continue_download: self.continue_download.or(defaults.continue_download),
            restrict_filenames: self.restrict_filenames.or(defaults.restrict_filenames),
            write_thumbnail: self.write_thumbnail.or(defaults.write_thumbnail),
            write_description: self.write_description.or(defaults.write_description),
            write_info_json: self.write_info_json.or(defaults.write_info_json),
            write_subtitles: self.write_subtitles.or(defaults.write_subtitles),
            extract_audio: self.extract_audio.or(defaults.extract_audio),
            audio_format: self.audio_format.or(defaults.audio_format),
            audio_quality: self.audio_quality.or(defaults.audio_quality),
            embed_subs: self.embed_subs.or(defaults.embed_subs),
            embed_thumbnail: self.embed_thumbnail.or(defaults.embed_thumbnail),
            embed_metadata: self.embed_metadata.or(defaults.embed_metadata),
            convert_subs: self.convert_subs.or(defaults.convert_subs),
            split_chapters: self.split_chapters.or(defaults.split_chapters),
            sponsorblock_mark: self.sponsorblock_mark.or(defaults.sponsorblock_mark),
            sponsorblock_remove: self.sponsorblock_remove.or(defaults.sponsorblock_remove),
            proxy: self.proxy.or(defaults.proxy),
            geo_verification_proxy: self
                .geo_verification_proxy
                .or(defaults.geo_verification_proxy),
            cookies_file: self.cookies_file.or(defaults.cookies_file),
            impersonate: self.impersonate.or(defaults.impersonate),
            force_ipv4: self.force_ipv4.or(defaults.force_ipv4),
            force_ipv6: self.force_ipv6.or(defaults.force_ipv6),
            no_check_certificates: self
                .no_check_certificates
                .or(defaults.no_check_certificates),
            add_headers: self.add_headers.or(defaults.add_headers),
            extra_args,
        }
    }
}

/// Success payload returned by a download executor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// Path of the written file
    pub filename: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Media title
    pub title: Option<String>,
}

/// Metadata returned by a probe (no download)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Media title
    pub title: Option<String>,
    /// Expected size in bytes (exact or approximate)
    pub filesize: Option<u64>,
    /// Duration in seconds
    pub duration_secs: Option<f64>,
}

/// Event emitted during queue and batch processing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// URL added to the queue
    Queued {
        /// The URL
        url: String,
    },

    /// URL removed from the queue before it was claimed
    Removed {
        /// The URL
        url: String,
    },

    /// Queue worker started
    QueueStarted {
        /// Items waiting when the run started
        pending: usize,
    },

    /// Queue paused (takes effect at the next item boundary)
    QueuePaused,

    /// Queue resumed
    QueueResumed,

    /// Queue stopped by the caller
    QueueStopped {
        /// Result records at the time of the stop
        processed: usize,
    },

    /// Queue worker reached the end of the list
    QueueCompleted {
        /// Completed records
        successful: usize,
        /// Failed records
        failed: usize,
    },

    /// A worker claimed a URL
    ItemStarted {
        /// The URL
        url: String,
        /// Position in the queue or batch
        index: usize,
        /// Batch worker identifier (None for the queue worker)
        #[serde(skip_serializing_if = "Option::is_none")]
        worker_id: Option<usize>,
    },

    /// A URL finished downloading
    ItemCompleted {
        /// The URL
        url: String,
        /// Position in the queue or batch
        index: usize,
        /// Downloaded file, if reported
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },

    /// A URL failed
    ItemFailed {
        /// The URL
        url: String,
        /// Position in the queue or batch
        index: usize,
        /// Error message
        error: String,
    },

    /// Batch run started
    BatchStarted {
        /// Number of URLs
        total: usize,
        /// Admission limit
        max_concurrent: usize,
    },

    /// Batch runner moved to the next chunk
    BatchChunk {
        /// Zero-based chunk number
        chunk: usize,
        /// Number of chunks
        chunks: usize,
        /// URLs in this chunk
        size: usize,
    },

    /// Batch run finished
    BatchCompleted {
        /// Number of result records
        total: usize,
        /// Completed records
        successful: usize,
        /// Failed records
        failed: usize,
    },

    /// Run log written
    RunLogSaved {
        /// Path of the log file
        path: PathBuf,
    },
}

/// Persisted JSON record of one batch execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    /// When the log was written
    pub timestamp: DateTime<Utc>,
    /// Number of submitted URLs
    pub total_urls: usize,
    /// Completed records
    pub successful: usize,
    /// Failed records
    pub failed: usize,
    /// Submitted URLs, in input order
    pub urls: Vec<String>,
    /// Result records, in completion order
    pub results: Vec<DownloadResult>,
}

impl RunLog {
    /// Build a log from the submitted URLs and their results
    pub fn new(urls: &[String], results: &[DownloadResult]) -> Self {
        Self {
            timestamp: Utc::now(),
            total_urls: urls.len(),
            successful: results.iter().filter(|r| r.is_completed()).count(),
            failed: results.iter().filter(|r| r.is_failed()).count(),
            urls: urls.to_vec(),
            results: results.to_vec(),
        }
    }
}

/// Validity report for a batch file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchFileReport {
    /// URLs found in the file
    pub total_urls: usize,
    /// Number of valid URLs
    pub valid_urls: usize,
    /// Number of invalid URLs
    pub invalid_urls: usize,
    /// The valid URLs, in file order
    pub valid_url_list: Vec<String>,
    /// The invalid URLs, in file order
    pub invalid_url_list: Vec<String>,
    /// True when no URL is invalid
    pub is_valid: bool,
}

/// Expected size of one URL
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeEstimateEntry {
    /// The URL
    pub url: String,
    /// Title from the probe, "Unknown" when the probe failed
    pub title: String,
    /// Expected size in bytes, 0 when unknown
    pub size: u64,
}

/// Expected size of a whole batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Sum of all per-URL estimates
    pub total_size_bytes: u64,
    /// Number of URLs probed
    pub url_count: usize,
    /// Per-URL estimates, in input order
    pub entries: Vec<SizeEstimateEntry>,
}

impl SizeEstimate {
    /// Total in MiB
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Total in GiB
    pub fn total_size_gb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Historical download record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique row identifier
    pub id: i64,
    /// The downloaded URL
    pub url: String,
    /// Media title, if known
    pub title: Option<String>,
    /// Downloaded file, if known
    pub filename: Option<String>,
    /// Final status
    pub status: ResultStatus,
    /// Size in bytes, if known
    pub size_bytes: Option<u64>,
    /// Error message for failed downloads
    pub error: Option<String>,
    /// When the download finished
    pub completed_at: DateTime<Utc>,
}
