//! URL pre-flight validation

use url::Url;

/// Decides whether a URL is worth submitting to the executor
pub trait UrlValidator: Send + Sync {
    /// True when the URL passes pre-flight checks
    fn is_valid(&self, url: &str) -> bool;
}

/// Accepts absolute `http`/`https` URLs that name a host
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicUrlValidator;

impl UrlValidator for BasicUrlValidator {
    fn is_valid(&self, url: &str) -> bool {
        match Url::parse(url.trim()) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "http" | "https")
                    && parsed.host_str().is_some_and(|h| !h.is_empty())
            }
            Err(_) => false,
        }
    }
}

/// Split URLs into (valid, invalid), keeping input order within each
pub fn partition_urls(
    validator: &dyn UrlValidator,
    urls: impl IntoIterator<Item = String>,
) -> (Vec<String>, Vec<String>) {
    urls.into_iter().partition(|url| validator.is_valid(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        let v = BasicUrlValidator;
        assert!(v.is_valid("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(v.is_valid("http://vimeo.com/123"));
        assert!(v.is_valid("  https://example.com/path  "));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        let v = BasicUrlValidator;
        assert!(!v.is_valid("ftp://example.com/file"));
        assert!(!v.is_valid("file:///etc/passwd"));
        assert!(!v.is_valid("not a url"));
        assert!(!v.is_valid("www.youtube.com/watch?v=x"));
        assert!(!v.is_valid(""));
    }

    #[test]
    fn partition_keeps_order() {
        let urls = vec![
            "https://a.test/1".to_string(),
            "bogus".to_string(),
            "https://b.test/2".to_string(),
            "mailto:x@y.z".to_string(),
        ];
        let (valid, invalid) = partition_urls(&BasicUrlValidator, urls);
        assert_eq!(valid, vec!["https://a.test/1", "https://b.test/2"]);
        assert_eq!(invalid, vec!["bogus", "mailto:x@y.z"]);
    }
}
