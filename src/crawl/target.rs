// src/crawl/target.rs
// =============================================================================
// Crawl targets and URL identity.
//
// Two links often point at the same page while being spelled differently:
//   https://example.com/docs/intro#setup
//   https://example.com/docs/intro/
//   https://example.com/docs/intro?b=2&a=1  vs  ?a=1&b=2
//
// normalize_url() reduces a URL to scheme + host + path + sorted query,
// dropping the fragment and a trailing slash, and that string is what we
// use to decide "have we seen this page already?".
//
// VisitedSet keeps two sets:
// - admitted: every key that ever entered the frontier (a URL is queued once)
// - visited:  every key that was dequeued for fetching
// =============================================================================

use std::collections::HashSet;
use url::Url;

/// A page waiting in (or taken from) the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The URL we will actually request (fragment removed)
    pub url: Url,
    /// Identity of the page, see `normalize_url`
    pub key: String,
    /// Link hops from the seed (the seed is depth 0)
    pub depth: usize,
}

impl CrawlTarget {
    /// Builds a target from an absolute URL at the given depth.
    pub fn new(mut url: Url, depth: usize) -> Self {
        url.set_fragment(None);
        let key = normalize_url(&url);
        Self { url, key, depth }
    }

    /// Parses `raw` and builds a target, or None if it isn't an absolute URL.
    pub fn parse(raw: &str, depth: usize) -> Option<Self> {
        Url::parse(raw.trim()).ok().map(|url| Self::new(url, depth))
    }
}

// Reduces a URL to the string used for de-duplication
//
// Rules:
//   - fragment removed
//   - query pairs sorted (and an empty "?" dropped)
//   - trailing slash removed, except for the root path "/"
//   - scheme and host are already lowercased by the url crate
//
// Example:
//   "https://Example.com/docs/?b=2&a=1#top" -> "https://example.com/docs?a=1&b=2"
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let mut pairs: Vec<(String, String)> = normalized.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        normalized.set_query(None);
    } else {
        pairs.sort();
        normalized.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        normalized.set_path(if trimmed.is_empty() { "/" } else { trimmed });
    }

    normalized.to_string()
}

/// Frontier admission and visit bookkeeping for one crawl session.
#[derive(Debug, Default)]
pub struct VisitedSet {
    admitted: HashSet<String>,
    visited: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` is entering the frontier.
    /// Returns false if it was already admitted once.
    pub fn admit(&mut self, key: &str) -> bool {
        if self.admitted.contains(key) {
            return false;
        }
        self.admitted.insert(key.to_string())
    }

    /// Marks `key` as visited. Returns false if it was visited before.
    pub fn mark_visited(&mut self, key: &str) -> bool {
        if self.visited.contains(key) {
            return false;
        }
        self.visited.insert(key.to_string())
    }

    pub fn is_visited(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    /// Number of distinct pages dequeued so far.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of distinct pages that ever entered the frontier.
    pub fn admitted_count(&self) -> usize {
        self.admitted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize_url(&Url::parse(raw).unwrap())
    }

    #[test]
    fn test_fragment_is_ignored() {
        assert_eq!(norm("https://example.com/docs/intro#setup"), "https://example.com/docs/intro");
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert_eq!(norm("https://example.com/docs/"), norm("https://example.com/docs"));
        assert_eq!(norm("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_query_is_sorted() {
        assert_eq!(
            norm("https://example.com/search?b=2&a=1"),
            "https://example.com/search?a=1&b=2"
        );
        assert_eq!(norm("https://example.com/page?"), "https://example.com/page");
    }

    #[test]
    fn test_host_case_is_ignored() {
        assert_eq!(norm("https://EXAMPLE.com/Docs"), "https://example.com/Docs");
    }

    #[test]
    fn test_target_keeps_fetchable_url() {
        let target = CrawlTarget::parse("https://example.com/docs/#top", 0).unwrap();
        assert_eq!(target.url.as_str(), "https://example.com/docs/");
        assert_eq!(target.key, "https://example.com/docs");
        assert!(CrawlTarget::parse("/relative/path", 1).is_none());
    }

    #[test]
    fn test_visited_set_admits_once() {
        let mut set = VisitedSet::new();
        assert!(set.admit("https://example.com/a"));
        assert!(!set.admit("https://example.com/a"));
        assert!(set.mark_visited("https://example.com/a"));
        assert!(!set.mark_visited("https://example.com/a"));
        assert!(set.is_visited("https://example.com/a"));
        assert_eq!(set.visited_count(), 1);
        assert_eq!(set.admitted_count(), 1);
    }
}
