// src/error.rs
// =============================================================================
// Error types shared by the crawl pipeline.
//
// The crawl has four kinds of problems and each one is handled differently:
// - Validation: a discovered URL is ineligible -> silently filtered, no error
// - Fetch: one page could not be fetched -> recorded on that page only
// - Content: a page is too thin -> recorded as "skipped", links still used
// - Configuration: a bad option -> fail before the first request goes out
//
// Only configuration errors (and output errors after the crawl) ever stop
// the program. Fetch errors are absorbed into the page's result.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the configuration or the seed URL, reported before crawling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The seed URL can't be crawled at all
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// An option is present but outside of its accepted range
    #[error("invalid value for '{option}': {reason}")]
    OutOfRange { option: &'static str, reason: String },

    /// An include/exclude pattern is not a valid regular expression
    #[error("invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The content selector is not a valid CSS selector list
    #[error("invalid content selector '{0}'")]
    InvalidSelector(String),

    /// The config file could not be read
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed (or has unknown keys)
    #[error("could not parse config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The sample config could not be written
    #[error("could not write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single page could not be fetched.
///
/// The `Display` text of each variant is what ends up in `PageResult::error`,
/// so it's kept short ("timeout", "HTTP 404", ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The page did not answer within the per-page timeout
    #[error("timeout")]
    Timeout,

    /// The server answered with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),

    /// The response is not something we can turn into markdown
    #[error("non-HTML content type: {0}")]
    UnsupportedContentType(String),

    /// Connection, DNS, TLS or body-read failures
    #[error("network error: {0}")]
    Network(String),

    /// The fetch capability itself is gone; the crawl can't continue
    #[error("fetcher unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// True if the whole session should stop, not just this page.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Unavailable(_))
    }
}

/// Sorts reqwest errors into timeouts, HTTP statuses, redirect loops,
/// connection problems and everything else.
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else if error.is_redirect() {
            FetchError::Network("too many redirects".to_string())
        } else if error.is_connect() {
            FetchError::Network(format!("connection failed: {}", error))
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// Problems while writing the output artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reason_is_plain() {
        assert_eq!(FetchError::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_status_reason() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
    }

    #[test]
    fn test_only_unavailable_is_fatal() {
        assert!(FetchError::Unavailable("gone".into()).is_fatal());
        assert!(!FetchError::Timeout.is_fatal());
        assert!(!FetchError::Network("reset".into()).is_fatal());
    }
}
