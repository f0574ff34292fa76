//! Batch file I/O: one URL per line, `#` comments

use crate::{Error, Result};
use std::path::Path;

const BATCH_TEMPLATE: &str = "\
# Batch download list
# Add one URL per line
# Lines starting with # are comments and will be ignored
# Example URLs:

# https://www.youtube.com/watch?v=example1
# https://www.youtube.com/watch?v=example2
# https://vimeo.com/example3

";

fn batch_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::BatchFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| batch_error(path, e))?;
    }
    Ok(())
}

/// Parse batch file content: trimmed lines, blanks and `#` comments skipped
pub fn parse_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Read the URLs listed in a batch file
pub async fn load_urls_from_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| batch_error(path, e))?;
    Ok(parse_urls(&content))
}

/// Write URLs one per line, creating parent directories
pub async fn save_urls_to_file(path: impl AsRef<Path>, urls: &[String]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path).await?;

    let mut content = String::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        content.push_str(url);
        content.push('\n');
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| batch_error(path, e))
}

/// Write a commented starter batch file
pub async fn create_batch_template(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path).await?;
    tokio::fs::write(path, BATCH_TEMPLATE)
        .await
        .map_err(|e| batch_error(path, e))?;
    tracing::info!(path = %path.display(), "batch template created");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let urls = parse_urls("# header\n\n  https://a.test/1  \n#https://b.test\n\thttps://c.test/2\n");
        assert_eq!(urls, vec!["https://a.test/1", "https://c.test/2"]);
    }

    #[tokio::test]
    async fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists/batch.txt");
        let urls = vec!["https://a.test/2".to_string(), "https://a.test/1".to_string()];

        save_urls_to_file(&path, &urls).await.unwrap();

        assert_eq!(load_urls_from_file(&path).await.unwrap(), urls);
    }

    #[tokio::test]
    async fn template_contains_no_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.txt");

        create_batch_template(&path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("one URL per line"));
        assert!(load_urls_from_file(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_a_batch_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");

        match load_urls_from_file(&path).await {
            Err(Error::BatchFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected BatchFile error, got {other:?}"),
        }
    }
}
