//! Configuration types for videomilker

use crate::error::{Error, Result};
use crate::types::DownloadOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Download behavior configuration (output location, naming, concurrency, yt-dlp tuning)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base download directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Put downloads in a per-day subfolder named after the day of month
    #[serde(default = "default_true")]
    pub create_day_folders: bool,

    /// yt-dlp output template for the file name (default: "%(upload_date)s_%(title)s")
    #[serde(default = "default_file_naming")]
    pub file_naming: String,

    /// Default quality selector (default: "best")
    #[serde(default = "default_quality")]
    pub default_quality: String,

    /// Default container format (default: "mp4")
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Maximum concurrent downloads for batch runs (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// yt-dlp retries per download (default: 10)
    #[serde(default = "default_ytdlp_retries")]
    pub retries: u32,

    /// yt-dlp retries per fragment (default: 10)
    #[serde(default = "default_ytdlp_retries")]
    pub fragment_retries: u32,

    /// Socket timeout (default: 30 seconds)
    #[serde(default = "default_socket_timeout", with = "duration_serde")]
    pub socket_timeout: Duration,

    /// Sleep between yt-dlp retries (default: 1 second)
    #[serde(default = "default_retry_sleep", with = "duration_serde")]
    pub retry_sleep: Duration,

    /// Resume partially downloaded files
    #[serde(default = "default_true")]
    pub continue_download: bool,

    /// Restrict file names to ASCII characters
    #[serde(default)]
    pub restrict_filenames: bool,

    /// Save the thumbnail next to each video
    #[serde(default)]
    pub save_thumbnail: bool,

    /// Save the description next to each video
    #[serde(default)]
    pub write_description: bool,

    /// Save the info JSON next to each video
    #[serde(default)]
    pub write_info_json: bool,

    /// Download subtitles when available
    #[serde(default)]
    pub auto_subtitle: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            create_day_folders: true,
            file_naming: default_file_naming(),
            default_quality: default_quality(),
            default_format: default_format(),
            max_concurrent: default_max_concurrent(),
            retries: default_ytdlp_retries(),
            fragment_retries: default_ytdlp_retries(),
            socket_timeout: default_socket_timeout(),
            retry_sleep: default_retry_sleep(),
            continue_download: true,
            restrict_filenames: false,
            save_thumbnail: false,
            write_description: false,
            write_info_json: false,
            auto_subtitle: false,
        }
    }
}

/// Post-processing applied by yt-dlp after a download
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostProcessingConfig {
    /// Keep only the audio track
    #[serde(default)]
    pub extract_audio: bool,

    /// Audio format for extraction (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Audio quality, 0 (best) to 10 (worst) (default: 5)
    #[serde(default = "default_audio_quality")]
    pub audio_quality: u8,

    /// Embed the thumbnail as cover art
    #[serde(default)]
    pub embed_thumbnail: bool,

    /// Embed subtitles into the video container
    #[serde(default)]
    pub embed_subs: bool,

    /// Convert subtitles to this format (e.g. "srt")
    #[serde(default)]
    pub convert_subs: Option<String>,

    /// Split the output file by chapters
    #[serde(default)]
    pub split_chapters: bool,

    /// SponsorBlock categories to mark as chapters
    #[serde(default)]
    pub sponsorblock_mark: Vec<String>,

    /// SponsorBlock categories to remove
    #[serde(default)]
    pub sponsorblock_remove: Vec<String>,
}

impl Default for PostProcessingConfig {
    fn default() -> Self {
        Self {
            extract_audio: false,
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            embed_thumbnail: false,
            embed_subs: false,
            convert_subs: None,
            split_chapters: false,
            sponsorblock_mark: vec![],
            sponsorblock_remove: vec![],
        }
    }
}

/// Network and request settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Proxy URL for all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Proxy used only for geo verification
    #[serde(default)]
    pub geo_verification_proxy: Option<String>,

    /// Netscape-format cookies file
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Browser client to impersonate (e.g. "chrome")
    #[serde(default)]
    pub impersonate: Option<String>,

    /// Force IPv4
    #[serde(default)]
    pub force_ipv4: bool,

    /// Force IPv6
    #[serde(default)]
    pub force_ipv6: bool,

    /// Skip TLS certificate validation
    #[serde(default)]
    pub no_check_certificates: bool,

    /// Extra HTTP headers as "Name:Value"
    #[serde(default)]
    pub add_headers: Vec<String>,
}

/// Batch runner chunking and run log settings
///
/// Chunk size is `ceil(total / chunk_divisor)` clamped to
/// `[min_chunk_size, max_chunk_size]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Smallest chunk (default: 10)
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Largest chunk (default: 50)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Number of chunks aimed for before clamping (default: 10)
    #[serde(default = "default_chunk_divisor")]
    pub chunk_divisor: usize,

    /// Directory for run logs (default: the batch folder under the download dir)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Write a run log after each batch (default: true)
    #[serde(default = "default_true")]
    pub save_logs: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            chunk_divisor: default_chunk_divisor(),
            log_dir: None,
            save_logs: true,
        }
    }
}

/// Retry configuration for transient executor failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first failure (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Download history store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Record finished downloads (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite database path (default: "history.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Rows kept when trimming (default: 1000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Age in days after which rows are purged (default: 30)
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: default_database_path(),
            max_entries: default_max_entries(),
            cleanup_days: default_cleanup_days(),
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit path to the yt-dlp binary
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Look up yt-dlp on PATH when no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
        }
    }
}

/// Main configuration for videomilker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Post-processing
    #[serde(default)]
    pub post_processing: PostProcessingConfig,

    /// Network and request settings
    #[serde(default)]
    pub advanced: AdvancedConfig,

    /// Batch chunking and run logs
    #[serde(default)]
    pub batch: BatchConfig,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Download history
    #[serde(default)]
    pub history: HistoryConfig,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults. Missing keys fall back to their
    /// defaults individually.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent == 0 {
            return Err(invalid("max_concurrent must be at least 1", "download.max_concurrent"));
        }
        if self.download.file_naming.trim().is_empty() {
            return Err(invalid("file naming template is empty", "download.file_naming"));
        }
        if self.batch.min_chunk_size == 0 {
            return Err(invalid("min_chunk_size must be at least 1", "batch.min_chunk_size"));
        }
        if self.batch.chunk_divisor == 0 {
            return Err(invalid("chunk_divisor must be at least 1", "batch.chunk_divisor"));
        }
        if self.batch.max_chunk_size < self.batch.min_chunk_size {
            return Err(invalid(
                "max_chunk_size must not be smaller than min_chunk_size",
                "batch.max_chunk_size",
            ));
        }
        if self.post_processing.audio_quality > 10 {
            return Err(invalid(
                "audio_quality must be between 0 and 10",
                "post_processing.audio_quality",
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(invalid(
                "backoff_multiplier must be a finite number of at least 1.0",
                "retry.backoff_multiplier",
            ));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(invalid(
                "initial_delay must not exceed max_delay",
                "retry.initial_delay",
            ));
        }
        if self.advanced.force_ipv4 && self.advanced.force_ipv6 {
            return Err(invalid(
                "force_ipv4 and force_ipv6 are mutually exclusive",
                "advanced.force_ipv6",
            ));
        }
        Ok(())
    }

    /// Default executor options derived from this configuration
    pub fn download_options(&self) -> DownloadOptions {
        let download = &self.download;
        let post = &self.post_processing;
        let advanced = &self.advanced;

        let template = format!("{}.%(ext)s", download.file_naming);
        let output_template = if download.create_day_folders {
            download
                .download_dir
                .join(day_folder_name())
                .join(template)
        } else {
            download.download_dir.join(template)
        };

        let format = if post.extract_audio {
            "bestaudio/best".to_string()
        } else {
            download.default_quality.clone()
        };

        DownloadOptions {
            output_template: Some(output_template.to_string_lossy().into_owned()),
            format: Some(format),
            merge_output_format: (!post.extract_audio).then(|| download.default_format.clone()),
            retries: Some(download.retries),
            fragment_retries: Some(download.fragment_retries),
            socket_timeout: Some(download.socket_timeout.as_secs()),
            retry_sleep: Some(download.retry_sleep.as_secs()),
            continue_download: Some(download.continue_download),
            restrict_filenames: Some(download.restrict_filenames),
            write_thumbnail: Some(download.save_thumbnail),
            write_description: Some(download.write_description),
            write_info_json: Some(download.write_info_json),
            write_subtitles: Some(download.auto_subtitle),
            extract_audio: Some(post.extract_audio),
            audio_format: post.extract_audio.then(|| post.audio_format.clone()),
            audio_quality: post.extract_audio.then_some(post.audio_quality),
            embed_subs: Some(post.embed_subs),
            embed_thumbnail: Some(post.embed_thumbnail),
            embed_metadata: None,
            convert_subs: post.convert_subs.clone(),
            split_chapters: Some(post.split_chapters),
            sponsorblock_mark: non_empty(&post.sponsorblock_mark),
            sponsorblock_remove: non_empty(&post.sponsorblock_remove),
            proxy: advanced.proxy.clone(),
            geo_verification_proxy: advanced.geo_verification_proxy.clone(),
            cookies_file: advanced.cookies_file.clone(),
            impersonate: advanced.impersonate.clone(),
            force_ipv4: advanced.force_ipv4.then_some(true),
            force_ipv6: advanced.force_ipv6.then_some(true),
            no_check_certificates: advanced.no_check_certificates.then_some(true),
            add_headers: non_empty(&advanced.add_headers),
            extra_args: vec![],
        }
    }
}

fn invalid(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Day-of-month subfolder name ("01".."31")
pub(crate) fn day_folder_name() -> String {
    chrono::Local::now().format("%d").to_string()
}

// Default value functions
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_file_naming() -> String {
    "%(upload_date)s_%(title)s".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

fn default_format() -> String {
    "mp4".to_string()
}

fn default_max_concurrent() -> usize {
    3
}

fn default_ytdlp_retries() -> u32 {
    10
}

fn default_socket_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_sleep() -> Duration {
    Duration::from_secs(1)
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> u8 {
    5
}

fn default_min_chunk_size() -> usize {
    10
}

fn default_max_chunk_size() -> usize {
    50
}

fn default_chunk_divisor() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_database_path() -> PathBuf {
    PathBuf::from("history.db")
}

fn default_max_entries() -> usize {
    1000
}

fn default_cleanup_days() -> u32 {
    30
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
