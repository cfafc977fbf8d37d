// src/crawl/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// Some documentation sites serve their pages as raw markdown (text/markdown
// or text/plain). For those we can't use the HTML link extractor, so we
// walk the markdown instead.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Is fast and memory-efficient (it's a streaming parser)
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};
use url::Url;

use super::html::resolve_url;

// Extracts all HTTP/HTTPS link targets from Markdown text
//
// Parameters:
//   markdown: the markdown text to parse
//   base: the page URL, used to resolve relative targets
//
// Returns: absolute URLs in document order, duplicates removed
//
// Example input:
//   "See [intro](./intro) and [Rust](https://www.rust-lang.org)!"
//   base = "https://example.com/docs/"
//
// Example output:
//   ["https://example.com/docs/intro", "https://www.rust-lang.org/"]
pub fn extract_markdown_links(markdown: &str, base: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    // pulldown-cmark emits Start(Link) / Text / End(Link) for every link;
    // the destination is on the Start event
    for event in Parser::new(markdown) {
        if let Event::Start(Tag::Link(_link_type, dest_url, _title)) = event {
            if let Some(url) = resolve_url(base, &dest_url) {
                if !links.contains(&url) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// First `# ` heading of a markdown document, used as a page title.
pub fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        let links = extract_markdown_links(markdown, &base());
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let markdown = r#"
# Resources

- [Intro](./intro)
- [Install](install.md)
- [Home](/)
        "#;
        let links = extract_markdown_links(markdown, &base());
        assert_eq!(
            links,
            vec![
                "https://example.com/docs/intro",
                "https://example.com/docs/install.md",
                "https://example.com/",
            ]
        );
    }

    #[test]
    fn test_skip_mailto_links() {
        let markdown = "Email me at [email](mailto:test@example.com)";
        assert!(extract_markdown_links(markdown, &base()).is_empty());
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(first_heading("intro\n# Title \nbody"), Some("Title".to_string()));
        assert_eq!(first_heading("## Sub only"), None);
    }
}
