// src/crawl/page.rs
// =============================================================================
// The per-page outcome of a crawl.
//
// Every fetch attempt produces exactly one PageResult, whatever happened:
//   Succeeded -> fetched, cleaned, and has enough content
//   Skipped   -> fetched fine but too thin (links were still followed)
//   Failed    -> could not be fetched (timeout, HTTP error, ...)
//
// PageResults are snapshots: once built they never change, and the chunker
// and output writer only ever read them.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid markdown link regex"));
static INLINE_FORMATTING: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`]").expect("valid formatting regex"));

const DESCRIPTION_MAX_CHARS: usize = 200;

/// What happened to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Fetched and kept
    Succeeded,
    /// Fetched but too little content to keep
    Skipped,
    /// Not fetched
    Failed,
}

/// The result of one fetch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// The URL that was requested
    pub url: String,
    /// Link hops from the seed
    pub depth: usize,
    pub title: String,
    /// First substantial paragraph, shortened
    pub description: String,
    /// Markdown as returned by the fetcher
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub raw_content: String,
    /// Markdown after the cleaning pipeline
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub cleaned_content: String,
    pub word_count: usize,
    pub status: PageStatus,
    /// Why the page was skipped or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Outbound links reported by the fetcher, in page order
    pub discovered_links: Vec<String>,
}

impl PageResult {
    /// Builds a result for a page that could not be fetched.
    pub fn failed(url: &Url, depth: usize, reason: String) -> Self {
        Self {
            url: url.to_string(),
            depth,
            title: title_from_url(url),
            description: String::new(),
            raw_content: String::new(),
            cleaned_content: String::new(),
            word_count: 0,
            status: PageStatus::Failed,
            error: Some(reason),
            discovered_links: Vec::new(),
        }
    }

    /// True for pages that made it into the results.
    pub fn success(&self) -> bool {
        self.status == PageStatus::Succeeded
    }

    /// "docs/getting-started" for https://example.com/docs/getting-started/
    /// ("home" for the site root). Used for sorting and grouping output.
    pub fn path(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .map(|url| {
                url.path_segments()
                    .map(|segments| segments.filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/"))
                    .unwrap_or_default()
            })
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| "home".to_string())
    }

    /// First path segment, the page's section in the output.
    pub fn section(&self) -> String {
        self.path().split('/').next().unwrap_or("home").to_string()
    }
}

/// Counts words the way the output documents report them.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// Picks a title for a page
//
// Order:
//   1. the title reported by the fetcher (<title> / first heading)
//   2. the first "# " header in the cleaned content
//   3. the first "## " header
//   4. the last URL path segment, title-cased ("getting-started" -> "Getting Started")
//   5. "Documentation"
pub fn derive_title(reported: Option<&str>, cleaned: &str, url: &Url) -> String {
    if let Some(title) = reported.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let headers = cleaned.lines().map(str::trim);
    for prefix in ["# ", "## "] {
        if let Some(title) = headers.clone().find_map(|line| line.strip_prefix(prefix)) {
            let title = title.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }

    title_from_url(url)
}

fn title_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string());

    match last {
        Some(segment) => {
            let stem = segment.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&segment);
            stem.split(|c| c == '-' || c == '_')
                .filter(|w| !w.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ")
        }
        None => "Documentation".to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

// Picks the first substantial paragraph line as a short description
//
// Skips headers and code blocks, strips link markup and *_` formatting,
// and keeps lines that still have more than 30 characters. Long lines are
// cut at 200 characters with "..." appended.
pub fn derive_description(cleaned: &str) -> String {
    let mut in_code_block = false;

    for line in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("```") || line.starts_with("~~~") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block || line.starts_with('#') || line.chars().count() <= 50 {
            continue;
        }

        let plain = MARKDOWN_LINK.replace_all(line, "$1");
        let plain = INLINE_FORMATTING.replace_all(&plain, "");
        if plain.chars().count() > 30 {
            return truncate(&plain, DESCRIPTION_MAX_CHARS);
        }
    }

    String::new()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_title_prefers_reported() {
        let title = derive_title(Some("Install Guide"), "# Other", &url("https://example.com/docs/install"));
        assert_eq!(title, "Install Guide");
    }

    #[test]
    fn test_title_from_headers() {
        let u = url("https://example.com/docs/install");
        assert_eq!(derive_title(None, "text\n# Installing\n## Sub", &u), "Installing");
        assert_eq!(derive_title(Some("  "), "## Only Sub", &u), "Only Sub");
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            derive_title(None, "no headers", &url("https://example.com/docs/getting-started/")),
            "Getting Started"
        );
        assert_eq!(derive_title(None, "", &url("https://example.com/docs/user_guide.html")), "User Guide");
        assert_eq!(derive_title(None, "", &url("https://example.com/")), "Documentation");
    }

    #[test]
    fn test_description_skips_headers_and_code() {
        let content = "# Title\n\n```\nthis line is inside a code block and is long enough to count\n```\n\nThis **paragraph** explains the [installer](https://example.com/i) in some detail.";
        assert_eq!(
            derive_description(content),
            "This paragraph explains the installer in some detail."
        );
    }

    #[test]
    fn test_description_is_truncated() {
        let long = "word ".repeat(100);
        let description = derive_description(&long);
        assert!(description.ends_with("..."));
        assert_eq!(description.chars().count(), 203);
    }

    #[test]
    fn test_path_and_section() {
        let page = PageResult::failed(&url("https://example.com/docs/guide/intro/"), 1, "timeout".into());
        assert_eq!(page.path(), "docs/guide/intro");
        assert_eq!(page.section(), "docs");
        assert!(!page.success());

        let root = PageResult::failed(&url("https://example.com/"), 0, "timeout".into());
        assert_eq!(root.path(), "home");
        assert_eq!(root.section(), "home");
    }
}
