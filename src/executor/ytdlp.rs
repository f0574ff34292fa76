//! Executor backed by the external yt-dlp binary

use super::parser::{ExitStatus, parse_download_output, parse_probe_output};
use super::traits::DownloadExecutor;
use crate::types::{DownloadOptions, DownloadOutcome, MediaInfo};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Executor that runs the `yt-dlp` binary once per URL
///
/// ```no_run
/// use videomilker::{DownloadExecutor, DownloadOptions, YtDlpExecutor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = YtDlpExecutor::from_path().expect("yt-dlp not found in PATH");
/// let outcome = executor
///     .download("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &DownloadOptions::default())
///     .await?;
/// println!("saved to {:?}", outcome.filename);
/// # Ok(())
/// # }
/// ```
pub struct YtDlpExecutor {
    binary_path: PathBuf,
}

impl YtDlpExecutor {
    /// Create an executor for an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Look for `yt-dlp` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Path of the binary this executor runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    async fn run(&self, args: &[String]) -> crate::Result<std::process::Output> {
        Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("failed to execute yt-dlp: {}", e)))
    }
}

#[async_trait]
impl DownloadExecutor for YtDlpExecutor {
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> crate::Result<DownloadOutcome> {
        let args = build_download_args(url, options);
        tracing::debug!(url = %url, args = ?args, "running yt-dlp");

        let output = self.run(&args).await?;
        parse_download_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    async fn probe(&self, url: &str) -> crate::Result<MediaInfo> {
        let output = self.run(&build_probe_args(url)).await?;
        parse_probe_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

fn push_value(args: &mut Vec<String>, flag: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, enabled: Option<bool>) {
    if enabled == Some(true) {
        args.push(flag.to_string());
    }
}

/// Command line for downloading one URL
pub fn build_download_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    let mut args = vec![
        "--no-simulate".to_string(),
        "--dump-json".to_string(),
        "--no-playlist".to_string(),
        "--no-progress".to_string(),
    ];

    push_value(&mut args, "-o", options.output_template.as_deref());
    push_value(&mut args, "-f", options.format.as_deref());
    push_value(
        &mut args,
        "--merge-output-format",
        options.merge_output_format.as_deref(),
    );
    push_value(&mut args, "--retries", options.retries);
    push_value(&mut args, "--fragment-retries", options.fragment_retries);
    push_value(&mut args, "--socket-timeout", options.socket_timeout);
    push_value(&mut args, "--retry-sleep", options.retry_sleep);

    match options.continue_download {
        Some(true) => args.push("--continue".to_string()),
        Some(false) => args.push("--no-continue".to_string()),
        None => {}
    }
    push_flag(&mut args, "--restrict-filenames", options.restrict_filenames);
    push_flag(&mut args, "--write-thumbnail", options.write_thumbnail);
    push_flag(&mut args, "--write-description", options.write_description);
    push_flag(&mut args, "--write-info-json", options.write_info_json);
    if options.write_subtitles == Some(true) {
        args.push("--write-subs".to_string());
        args.push("--write-auto-subs".to_string());
    }

    if options.extract_audio == Some(true) {
        args.push("-x".to_string());
        push_value(&mut args, "--audio-format", options.audio_format.as_deref());
        push_value(&mut args, "--audio-quality", options.audio_quality);
    }
    push_flag(&mut args, "--embed-subs", options.embed_subs);
    push_flag(&mut args, "--embed-thumbnail", options.embed_thumbnail);
    push_flag(&mut args, "--embed-metadata", options.embed_metadata);
    push_value(&mut args, "--convert-subs", options.convert_subs.as_deref());
    push_flag(&mut args, "--split-chapters", options.split_chapters);
    push_value(
        &mut args,
        "--sponsorblock-mark",
        options.sponsorblock_mark.as_ref().map(|c| c.join(",")),
    );
    push_value(
        &mut args,
        "--sponsorblock-remove",
        options.sponsorblock_remove.as_ref().map(|c| c.join(",")),
    );

    push_value(&mut args, "--proxy", options.proxy.as_deref());
    push_value(
        &mut args,
        "--geo-verification-proxy",
        options.geo_verification_proxy.as_deref(),
    );
    push_value(
        &mut args,
        "--cookies",
        options
            .cookies_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
    );
    push_value(&mut args, "--impersonate", options.impersonate.as_deref());
    push_flag(&mut args, "--force-ipv4", options.force_ipv4);
    push_flag(&mut args, "--force-ipv6", options.force_ipv6);
    push_flag(
        &mut args,
        "--no-check-certificates",
        options.no_check_certificates,
    );
    for header in options.add_headers.iter().flatten() {
        args.push("--add-headers".to_string());
        args.push(header.clone());
    }

    args.extend(options.extra_args.iter().cloned());
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Command line for probing one URL without downloading
pub fn build_probe_args(url: &str) -> Vec<String> {
    vec![
        "--dump-json".to_string(),
        "--skip-download".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}
