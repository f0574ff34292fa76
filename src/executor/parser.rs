//! Parser for yt-dlp command output

use crate::error::DownloadError;
use crate::types::{DownloadOutcome, MediaInfo};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited with code 0
    Success,
    /// The command exited with a non-zero code or was killed
    Failure,
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

fn error_line_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?m)^ERROR:\s*(.+?)\s*$").ok())
        .as_ref()
}

/// Pick the most useful failure text out of yt-dlp's stderr
///
/// yt-dlp prefixes fatal errors with `ERROR:`; the last such line wins. When
/// there is none the last non-empty line is used.
pub fn extract_error_message(stderr: &str) -> String {
    let tagged = error_line_pattern().and_then(|pattern| {
        pattern
            .captures_iter(stderr)
            .filter_map(|caps| caps.get(1))
            .last()
            .map(|m| m.as_str().to_string())
    });

    tagged
        .or_else(|| {
            stderr
                .lines()
                .map(str::trim)
                .rfind(|line| !line.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "yt-dlp exited without an error message".to_string())
}

/// Last JSON object printed on stdout (one per line with `--dump-json`)
fn last_json_document(stdout: &[u8]) -> crate::Result<Value> {
    let output = String::from_utf8_lossy(stdout);
    let line = output
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with('{'))
        .ok_or_else(|| crate::Error::ExternalTool("yt-dlp printed no metadata".into()))?;

    Ok(serde_json::from_str(line)?)
}

fn as_size(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
}

fn as_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Parse the output of a download run (`--no-simulate --dump-json`)
pub fn parse_download_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<DownloadOutcome> {
    if exit_status == ExitStatus::Failure {
        let stderr = String::from_utf8_lossy(stderr);
        return Err(DownloadError::from_message(extract_error_message(&stderr)).into());
    }

    let info = last_json_document(stdout)?;
    let requested = info
        .get("requested_downloads")
        .and_then(Value::as_array)
        .and_then(|downloads| downloads.first());

    let filename = as_string(requested.and_then(|r| r.get("filepath")))
        .or_else(|| as_string(info.get("filepath")))
        .or_else(|| as_string(info.get("_filename")))
        .or_else(|| as_string(info.get("filename")));

    let size = as_size(requested.and_then(|r| r.get("filesize")))
        .or_else(|| as_size(info.get("filesize")))
        .or_else(|| as_size(info.get("filesize_approx")));

    Ok(DownloadOutcome {
        filename,
        size,
        title: as_string(info.get("title")),
    })
}

/// Parse the output of a metadata probe (`--dump-json --skip-download`)
pub fn parse_probe_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<MediaInfo> {
    if exit_status == ExitStatus::Failure {
        let stderr = String::from_utf8_lossy(stderr);
        return Err(DownloadError::from_message(extract_error_message(&stderr)).into());
    }

    let info = last_json_document(stdout)?;
    Ok(MediaInfo {
        title: as_string(info.get("title")),
        filesize: as_size(info.get("filesize")).or_else(|| as_size(info.get("filesize_approx"))),
        duration_secs: info.get("duration").and_then(Value::as_f64),
    })
}
