// src/crawl/queue.rs
// =============================================================================
// This module implements documentation crawling with a breadth-first approach.
//
// How it works:
// 1. Start with the seed URL in a queue (the "frontier") at depth 0
// 2. Take the next page from the front of the queue and mark it visited
// 3. Fetch it (with a per-page timeout) and clean its markdown
// 4. Push every valid, never-seen link to the back of the queue at depth+1
// 5. Repeat until the queue is empty or enough pages succeeded
//
// Every fetch attempt becomes a PageResult (succeeded / skipped / failed);
// one bad page never stops the crawl. Whatever was collected before a stop
// (page budget, cancellation, wall-clock budget, fetcher gone) is returned.
//
// Politeness:
// - Waits a configurable delay between consecutive fetches
// - Only follows links on the seed's domain (and its subdomains)
//
// Concurrency:
// - Strictly one page at a time. The only waits are the fetch itself and
//   the pacing delay. Frontier and visited set belong to one Crawler::crawl
//   call and are dropped with it.
// =============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::fetch::{FetchRequest, FetchedPage, Fetcher};
use super::page::{derive_description, derive_title, word_count, PageResult, PageStatus};
use super::patterns::CrawlPatterns;
use super::target::{CrawlTarget, VisitedSet};
use super::validate::is_valid;
use crate::clean::clean_with_base;
use crate::error::{ConfigError, FetchError};

/// Knobs for one crawl session.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Stop once this many pages succeeded
    pub max_pages: usize,
    /// Pause between two fetches
    pub crawl_delay: Duration,
    /// Upper bound for a single fetch
    pub page_timeout: Duration,
    /// Pages with fewer words are skipped
    pub min_word_count: usize,
    /// Pages with fewer characters of cleaned content are skipped
    pub min_content_length: usize,
    pub headless: bool,
    pub content_selector: Option<String>,
    pub excluded_tags: Vec<String>,
    /// Don't follow links found deeper than this (seed = 0)
    pub max_depth: Option<usize>,
    /// Only enqueue the first N new links of each page
    pub max_links_per_page: Option<usize>,
    /// Stop dequeuing after this much wall-clock time
    pub max_duration: Option<Duration>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 50,
            crawl_delay: Duration::from_millis(500),
            page_timeout: Duration::from_secs(30),
            min_word_count: 20,
            min_content_length: 100,
            headless: true,
            content_selector: None,
            excluded_tags: Vec::new(),
            max_depth: None,
            max_links_per_page: None,
            max_duration: None,
        }
    }
}

/// External stop signal for a running crawl (e.g. Ctrl-C).
///
/// Cloning shares the flag; cancelling any clone stops the crawl before
/// the next page is dequeued.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why the crawl loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum StopReason {
    /// Nothing left to crawl
    FrontierExhausted,
    /// `max_pages` pages succeeded
    PageBudgetReached,
    /// The cancel token fired
    Cancelled,
    /// `max_duration` elapsed
    TimeBudgetExceeded,
    /// The fetcher reported it can't serve any more pages
    FetcherUnavailable(String),
}

/// Everything a crawl session produced.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Normalized seed URL
    pub seed: String,
    /// Host the crawl was restricted to
    pub base_domain: String,
    /// One entry per fetch attempt, in fetch order
    pub pages: Vec<PageResult>,
    /// Distinct pages taken from the frontier
    pub visited: usize,
    /// Times a page was taken from the frontier and processed
    pub dequeued: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn count(&self, status: PageStatus) -> usize {
        self.pages.iter().filter(|p| p.status == status).count()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &PageResult> {
        self.pages.iter().filter(|p| p.success())
    }

    /// Percentage of fetch attempts that succeeded (100 when nothing was fetched).
    pub fn success_rate(&self) -> f64 {
        if self.pages.is_empty() {
            100.0
        } else {
            self.count(PageStatus::Succeeded) as f64 / self.pages.len() as f64 * 100.0
        }
    }
}

/// Breadth-first documentation crawler.
pub struct Crawler<F: Fetcher> {
    fetcher: F,
    settings: CrawlSettings,
    patterns: CrawlPatterns,
    cancel: CancelToken,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, settings: CrawlSettings, patterns: CrawlPatterns) -> Self {
        Self {
            fetcher,
            settings,
            patterns,
            cancel: CancelToken::new(),
        }
    }

    /// Uses an externally owned cancel token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    // Crawls the site starting from a seed URL
    //
    // Parameters:
    //   seed_url: where to start, must be an absolute http(s) URL
    //
    // Returns:
    //   Ok(CrawlReport) with every PageResult collected, whatever the stop reason
    //   Err(ConfigError) only if the seed itself is unusable (nothing fetched)
    pub async fn crawl(&self, seed_url: &str) -> Result<CrawlReport, ConfigError> {
        let started = Instant::now();
        let seed = parse_seed(seed_url)?;
        let base_domain = seed
            .url
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_string())
            .ok_or_else(|| ConfigError::InvalidSeed {
                url: seed_url.to_string(),
                reason: "URL has no host".to_string(),
            })?;

        info!(
            seed = %seed.url,
            base_domain = %base_domain,
            max_pages = self.settings.max_pages,
            "starting crawl"
        );

        let mut frontier: VecDeque<CrawlTarget> = VecDeque::new();
        let mut visited = VisitedSet::new();
        let mut pages: Vec<PageResult> = Vec::new();
        let mut succeeded = 0usize;
        let mut dequeued = 0usize;

        let seed_key = seed.key.clone();
        visited.admit(&seed.key);
        frontier.push_back(seed);

        let stop_reason = loop {
            if succeeded >= self.settings.max_pages {
                break StopReason::PageBudgetReached;
            }
            if let Some(reason) = self.interrupted(started) {
                break reason;
            }

            let target = match frontier.pop_front() {
                Some(target) => target,
                None => break StopReason::FrontierExhausted,
            };

            // Polite crawling: pause between consecutive fetches
            if dequeued > 0 && !self.settings.crawl_delay.is_zero() {
                tokio::time::sleep(self.settings.crawl_delay).await;

                // The pause itself may run past the time budget or a Ctrl-C
                if let Some(reason) = self.interrupted(started) {
                    break reason;
                }
            }

            // Mark visited as soon as it leaves the queue, before fetching
            if !visited.mark_visited(&target.key) {
                continue;
            }
            dequeued += 1;

            debug!(url = %target.url, depth = target.depth, "fetching");

            let outcome = self.fetch_with_timeout(&target.url).await;
            let page = match outcome {
                Ok(fetched) => self.process_page(&target, fetched),
                Err(err) if err.is_fatal() => {
                    error!(url = %target.url, error = %err, "fetcher unavailable, stopping crawl");
                    pages.push(PageResult::failed(&target.url, target.depth, err.to_string()));
                    break StopReason::FetcherUnavailable(err.to_string());
                }
                Err(err) => {
                    warn!(url = %target.url, reason = %err, "page failed");
                    PageResult::failed(&target.url, target.depth, err.to_string())
                }
            };

            if page.status != PageStatus::Failed {
                self.enqueue_links(&page, &target, &base_domain, &mut visited, &mut frontier);
            }

            if page.success() {
                succeeded += 1;
            }
            pages.push(page);
        };

        let report = CrawlReport {
            seed: seed_key,
            base_domain,
            visited: visited.visited_count(),
            dequeued,
            pages,
            stop_reason,
            elapsed: started.elapsed(),
        };

        info!(
            succeeded = report.count(PageStatus::Succeeded),
            skipped = report.count(PageStatus::Skipped),
            failed = report.count(PageStatus::Failed),
            stop = ?report.stop_reason,
            "crawl finished"
        );

        Ok(report)
    }

    // Cancellation or an exhausted wall-clock budget, checked before each fetch
    fn interrupted(&self, started: Instant) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.settings.max_duration {
            Some(budget) if started.elapsed() >= budget => Some(StopReason::TimeBudgetExceeded),
            _ => None,
        }
    }

    async fn fetch_with_timeout(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let request = FetchRequest {
            url: url.clone(),
            timeout: self.settings.page_timeout,
            headless: self.settings.headless,
            content_selector: self.settings.content_selector.clone(),
            excluded_tags: self.settings.excluded_tags.clone(),
        };

        match tokio::time::timeout(self.settings.page_timeout, self.fetcher.fetch(&request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(FetchError::Timeout),
        }
    }

    // Cleans a fetched page and decides between Succeeded and Skipped
    fn process_page(&self, target: &CrawlTarget, fetched: FetchedPage) -> PageResult {
        let cleaned = clean_with_base(&fetched.raw_markdown, &target.url);
        let words = word_count(&cleaned);
        let chars = cleaned.chars().count();

        let thin_reason = if words < self.settings.min_word_count {
            Some(format!("content-poor: {} words (minimum {})", words, self.settings.min_word_count))
        } else if chars < self.settings.min_content_length {
            Some(format!(
                "content-poor: {} characters (minimum {})",
                chars, self.settings.min_content_length
            ))
        } else {
            None
        };

        let status = match &thin_reason {
            Some(reason) => {
                info!(url = %target.url, reason = %reason, "skipped");
                PageStatus::Skipped
            }
            None => {
                info!(url = %target.url, words, links = fetched.discovered_links.len(), "crawled");
                PageStatus::Succeeded
            }
        };

        PageResult {
            url: target.url.to_string(),
            depth: target.depth,
            title: derive_title(fetched.title.as_deref(), &cleaned, &target.url),
            description: derive_description(&cleaned),
            raw_content: fetched.raw_markdown,
            cleaned_content: cleaned,
            word_count: words,
            status,
            error: thin_reason,
            discovered_links: fetched.discovered_links,
        }
    }

    // Adds the page's valid, never-seen links to the back of the frontier
    fn enqueue_links(
        &self,
        page: &PageResult,
        parent: &CrawlTarget,
        base_domain: &str,
        visited: &mut VisitedSet,
        frontier: &mut VecDeque<CrawlTarget>,
    ) {
        if let Some(max_depth) = self.settings.max_depth {
            if parent.depth >= max_depth {
                return;
            }
        }

        let limit = self.settings.max_links_per_page.unwrap_or(usize::MAX);
        let mut added = 0usize;

        for link in &page.discovered_links {
            if added >= limit {
                break;
            }
            if !is_valid(link, base_domain, &self.patterns) {
                debug!(link = %link, "filtered");
                continue;
            }
            let child = match CrawlTarget::parse(link, parent.depth + 1) {
                Some(child) => child,
                None => continue,
            };
            if visited.admit(&child.key) {
                frontier.push_back(child);
                added += 1;
            }
        }
    }
}

fn parse_seed(seed_url: &str) -> Result<CrawlTarget, ConfigError> {
    let url = Url::parse(seed_url.trim()).map_err(|e| ConfigError::InvalidSeed {
        url: seed_url.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidSeed {
            url: seed_url.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(CrawlTarget::new(url, 0))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a VecDeque?
//    - push_back() adds to the end, pop_front() takes from the start
//    - That gives breadth-first order: all pages at depth 1 are fetched
//      before any page at depth 2
//
// 2. Why mark visited on dequeue and admit on enqueue?
//    - admit() keeps a URL from entering the queue twice, even when two
//      pages link to it before it is fetched
//    - mark_visited() happens before the fetch starts, so visited_count()
//      always equals the number of pages processed
//
// 3. Why does a skipped page still add links?
//    - Index pages are often thin ("Contents: A, B, C") but link to the
//      pages we actually want
//
// 4. Why is the time budget checked again after the pause?
//    - A long crawl_delay can run past max_duration on its own; checking
//      only at the top of the loop would start one fetch too many
//    - tokio's Instant is used so paused test time drives the budget too
//
// 5. What is `break value` inside `loop`?
//    - `loop` is an expression; `break StopReason::Cancelled` ends the loop
//      and makes the whole loop evaluate to that value
// -----------------------------------------------------------------------------
