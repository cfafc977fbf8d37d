// src/crawl/html.rs
// =============================================================================
// This module pulls the useful parts out of an HTML page.
//
// For every fetched page we need three things:
// - the outbound links (to grow the frontier)
// - the title
// - the main content area, without navigation/footer/script noise,
//   converted to markdown
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// and `html2md` to turn the selected HTML fragment into markdown.
// =============================================================================

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Selectors tried (in order) when no content selector is configured.
const MAIN_CONTENT_FALLBACKS: &[&str] = &[
    "main",
    "[role=main]",
    "article",
    ".markdown-body",
    ".docs-content",
    ".content",
    "#content",
    "body",
];

// Extracts all links from HTML content
//
// Parameters:
//   document: the parsed page
//   base: the URL of the page (for resolving relative links)
//
// Returns: absolute http(s) URLs in document order, duplicates removed.
// Fragments are kept; the validator decides what to do with them.
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   base = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_url(base, href) {
                if !links.contains(&absolute_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

// Resolves a possibly-relative URL to an absolute URL
//
// Parameters:
//   base: the base URL (the current page)
//   href: the href value (might be relative, might be absolute)
//
// Returns: Some(absolute_url) or None if it isn't an http(s) link
//
// Examples:
//   base = "https://example.com/docs/page"
//   href = "intro"              -> Some("https://example.com/docs/intro")
//   href = "../other"           -> Some("https://example.com/other")
//   href = "#section"           -> None (same page)
//   href = "javascript:void(0)" -> None (not HTTP)
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => base.join(href).ok()?,
    };

    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved.to_string())
    } else {
        None
    }
}

/// Page title: `<title>`, falling back to the first `<h1>`.
pub fn extract_title(document: &Html) -> Option<String> {
    ["head > title", "title", "h1"]
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .filter(|text| !text.is_empty())
        })
}

// Finds the main content element and converts it to markdown
//
// Parameters:
//   document: the parsed page
//   content_selector: optional CSS selector list from the config
//                     (e.g. "main, .content, article"); the first element
//                     in document order matching any of them wins
//   excluded_tags: tag names whose whole subtree is dropped (nav, footer...)
//
// Returns: markdown for the content area (possibly empty)
pub fn extract_markdown(document: &Html, content_selector: Option<&str>, excluded_tags: &[String]) -> String {
    let content = select_content(document, content_selector);

    let html = match content {
        Some(element) => {
            let mut out = String::new();
            write_filtered(element, excluded_tags, &mut out);
            out
        }
        None => String::new(),
    };

    html2md::parse_html(&html)
}

fn select_content<'a>(document: &'a Html, content_selector: Option<&str>) -> Option<ElementRef<'a>> {
    if let Some(selector) = content_selector.and_then(|s| Selector::parse(s).ok()) {
        if let Some(element) = document.select(&selector).next() {
            return Some(element);
        }
    }

    MAIN_CONTENT_FALLBACKS
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|selector| document.select(&selector).next())
}

// Serializes an element back to HTML, skipping excluded subtrees
fn write_filtered(element: ElementRef<'_>, excluded_tags: &[String], out: &mut String) {
    let name = element.value().name();
    if is_excluded_tag(name, excluded_tags) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_html(value).replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_filtered(child_element, excluded_tags, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(&escape_html(text));
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_excluded_tag(name: &str, excluded_tags: &[String]) -> bool {
    excluded_tags.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = Html::parse_document(r#"<a href="https://www.rust-lang.org">Rust</a>"#);
        assert_eq!(extract_links(&html, &base()), vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_link() {
        let html = Html::parse_document(r#"<a href="intro">Intro</a><a href="/guide">Guide</a>"#);
        assert_eq!(
            extract_links(&html, &base()),
            vec!["https://example.com/docs/intro", "https://example.com/guide"]
        );
    }

    #[test]
    fn test_skip_mailto_and_anchor() {
        let html = Html::parse_document(
            r##"<a href="mailto:test@example.com">Email</a><a href="#top">Top</a><a href="javascript:void(0)">JS</a>"##,
        );
        assert!(extract_links(&html, &base()).is_empty());
    }

    #[test]
    fn test_duplicate_links_are_listed_once() {
        let html = Html::parse_document(r#"<a href="/a">A</a><a href="/b">B</a><a href="/a">A again</a>"#);
        assert_eq!(
            extract_links(&html, &base()),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_extract_title() {
        let html = Html::parse_document("<html><head><title> Getting\n Started </title></head></html>");
        assert_eq!(extract_title(&html), Some("Getting Started".to_string()));

        let html = Html::parse_document("<html><body><h1>Install</h1></body></html>");
        assert_eq!(extract_title(&html), Some("Install".to_string()));

        let html = Html::parse_document("<html><body><p>no title</p></body></html>");
        assert_eq!(extract_title(&html), None);
    }

    #[test]
    fn test_main_content_skips_excluded_tags() {
        let html = Html::parse_document(
            r#"<html><body>
                <nav>Home Docs Blog</nav>
                <main><h1>Install</h1><p>Run the installer.</p><footer>Footer text</footer></main>
            </body></html>"#,
        );
        let excluded = vec!["nav".to_string(), "footer".to_string()];
        let markdown = extract_markdown(&html, None, &excluded);

        assert!(markdown.contains("Install"));
        assert!(markdown.contains("Run the installer."));
        assert!(!markdown.contains("Footer text"));
        assert!(!markdown.contains("Home Docs Blog"));
    }

    #[test]
    fn test_content_selector_wins() {
        let html = Html::parse_document(
            r#"<html><body><main><p>Main text</p></main><div class="docs"><p>Docs text</p></div></body></html>"#,
        );
        let markdown = extract_markdown(&html, Some(".docs"), &[]);
        assert!(markdown.contains("Docs text"));
        assert!(!markdown.contains("Main text"));
    }

    #[test]
    fn test_code_text_is_escaped_before_conversion() {
        let html = Html::parse_document(
            r#"<html><body><main><pre><code>if a &lt; b &amp;&amp; c {
    render("&lt;b&gt;bold&lt;/b&gt;");
}</code></pre></main></body></html>"#,
        );
        let markdown = extract_markdown(&html, None, &[]);

        assert!(markdown.contains("if a < b && c {"), "got {:?}", markdown);
        assert!(markdown.contains(r#"render("<b>bold</b>");"#), "got {:?}", markdown);
        assert!(!markdown.contains("&lt;"));
    }
}
