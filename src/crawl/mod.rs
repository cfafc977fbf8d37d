// src/crawl/mod.rs
// =============================================================================
// This module handles discovering and fetching documentation pages.
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - Stays on the seed's host (with or without "www.")
// - Include/exclude URL patterns, detected from the seed when not configured
// - Polite crawling with a delay between requests
// - Every fetch attempt ends up as a PageResult (succeeded/skipped/failed)
//
// Layout:
// - target:   URL normalization and the visited set
// - patterns: include/exclude regexes and pattern auto-detection
// - validate: is a discovered link worth crawling?
// - fetch:    the Fetcher trait and the HTTP implementation
// - html/markdown: turning responses into markdown + links
// - page:     per-page results, titles and descriptions
// - queue:    the crawl loop itself
// =============================================================================

mod fetch;
mod html;
mod markdown;
mod page;
mod patterns;
mod queue;
mod target;
mod validate;

pub use fetch::{page_from_html, page_from_markdown, FetchRequest, FetchedPage, Fetcher, HttpFetcher};
pub use page::{derive_description, derive_title, word_count, PageResult, PageStatus};
pub use patterns::{detect_patterns, CrawlPatterns, DEFAULT_EXCLUDES};
pub use queue::{CancelToken, CrawlReport, CrawlSettings, Crawler, StopReason};
pub use target::{normalize_url, CrawlTarget, VisitedSet};
pub use validate::{is_same_site, is_valid};
