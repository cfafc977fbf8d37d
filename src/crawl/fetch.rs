// src/crawl/fetch.rs
// =============================================================================
// The fetch capability: "given a URL, give me markdown, a title and links".
//
// The crawler doesn't care how a page is fetched or rendered. It only talks
// to the Fetcher trait, which makes it easy to:
// - use the built-in HttpFetcher (reqwest + scraper + html2md)
// - plug in a browser-based renderer
// - test the crawler with scripted in-memory pages
//
// Fetching is the only place the crawl waits on the outside world, so it is
// the only async operation in the pipeline.
// =============================================================================

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::html;
use super::markdown::{extract_markdown_links, first_heading};
use crate::error::FetchError;

/// Everything a fetcher needs to know about one request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute URL to fetch
    pub url: Url,
    /// Upper bound for this one page
    pub timeout: Duration,
    /// Ask browser-based fetchers to run without a window
    pub headless: bool,
    /// CSS selector list for the main content area
    pub content_selector: Option<String>,
    /// Tags whose subtrees are dropped before conversion
    pub excluded_tags: Vec<String>,
}

/// What a successful fetch returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Page content as (uncleaned) markdown
    pub raw_markdown: String,
    /// Title as reported by the page, if any
    pub title: Option<String>,
    /// Absolute outbound links, in page order
    pub discovered_links: Vec<String>,
}

/// A source of pages.
///
/// Implementations must be cheap to call repeatedly; the crawler calls
/// `fetch` once per page, one page at a time, and wraps it in its own
/// timeout.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Result<FetchedPage, FetchError>>;
}

/// Fetches pages over plain HTTP(S).
///
/// There is no JavaScript engine here: pages that only render client-side
/// come back mostly empty and end up "skipped" for thin content.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Creates the HTTP client with reasonable settings
    // We reuse this client for all requests (connection pooling)
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .build()
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        Ok(Self { client })
    }

    async fn fetch_page(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        if !request.headless {
            debug!(url = %request.url, "headless=false has no effect on the HTTP fetcher");
        }

        let response = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Links are resolved against the final URL (after redirects)
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let kind = BodyKind::from_content_type(&content_type)
            .ok_or_else(|| FetchError::UnsupportedContentType(content_type.clone()))?;

        let body = response.text().await?;

        Ok(match kind {
            BodyKind::Html => page_from_html(&body, &final_url, request),
            BodyKind::Markdown => page_from_markdown(body, &final_url),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Result<FetchedPage, FetchError>> {
        self.fetch_page(request).boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    Markdown,
}

impl BodyKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.contains("text/html") || content_type.contains("application/xhtml") {
            Some(BodyKind::Html)
        } else if content_type.contains("text/markdown")
            || content_type.contains("text/x-markdown")
            || content_type.contains("text/plain")
        {
            Some(BodyKind::Markdown)
        } else {
            None
        }
    }
}

/// Turns an HTML body into a FetchedPage.
pub fn page_from_html(body: &str, page_url: &Url, request: &FetchRequest) -> FetchedPage {
    let document = Html::parse_document(body);

    FetchedPage {
        raw_markdown: html::extract_markdown(
            &document,
            request.content_selector.as_deref(),
            &request.excluded_tags,
        ),
        title: html::extract_title(&document),
        discovered_links: html::extract_links(&document, page_url),
    }
}

/// Turns a markdown body into a FetchedPage.
pub fn page_from_markdown(body: String, page_url: &Url) -> FetchedPage {
    FetchedPage {
        title: first_heading(&body),
        discovered_links: extract_markdown_links(&body, page_url),
        raw_markdown: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> FetchRequest {
        FetchRequest {
            url: Url::parse(url).unwrap(),
            timeout: Duration::from_secs(5),
            headless: true,
            content_selector: None,
            excluded_tags: vec!["nav".to_string()],
        }
    }

    #[test]
    fn test_body_kind_from_content_type() {
        assert_eq!(BodyKind::from_content_type("text/html; charset=utf-8"), Some(BodyKind::Html));
        assert_eq!(BodyKind::from_content_type("text/markdown"), Some(BodyKind::Markdown));
        assert_eq!(BodyKind::from_content_type("application/pdf"), None);
        assert_eq!(BodyKind::from_content_type("image/png"), None);
    }

    #[test]
    fn test_page_from_html() {
        let req = request("https://example.com/docs/");
        let body = r#"<html><head><title>Docs Home</title></head><body>
            <nav><a href="/pricing">Pricing</a></nav>
            <main><h1>Welcome</h1><p>Read the <a href="intro">intro</a>.</p></main>
        </body></html>"#;

        let page = page_from_html(body, &req.url, &req);
        assert_eq!(page.title.as_deref(), Some("Docs Home"));
        assert!(page.raw_markdown.contains("Welcome"));
        assert!(!page.raw_markdown.contains("Pricing"));
        // Links come from the whole document, not just the content area
        assert_eq!(
            page.discovered_links,
            vec!["https://example.com/pricing", "https://example.com/docs/intro"]
        );
    }

    #[test]
    fn test_page_from_markdown() {
        let url = Url::parse("https://example.com/docs/").unwrap();
        let page = page_from_markdown("# Guide\n\nSee [setup](setup).".to_string(), &url);
        assert_eq!(page.title.as_deref(), Some("Guide"));
        assert_eq!(page.discovered_links, vec!["https://example.com/docs/setup"]);
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new("doc-harvester-test", Duration::from_secs(1)).is_ok());
    }
}
