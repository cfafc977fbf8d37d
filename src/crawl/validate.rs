// src/crawl/validate.rs
// =============================================================================
// Decides whether a discovered URL is worth crawling.
//
// Rules, in order (the first failing rule rejects):
// 1. It parses as an absolute http:// or https:// URL
// 2. Its host is the base domain or a subdomain of it
// 3. It has no unresolved template placeholders (${x}, {{x}}, <x>, %7B..)
// 4. It matches no exclude pattern
// 5. It matches an include pattern (if there are any)
//
// This is pure string/structure checking: no network, no side effects.
// Bad input (empty string, garbage) is simply "not valid".
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::patterns::CrawlPatterns;

// ${name}, {{name}} and <name> shapes in the raw link text
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{[^}]*\}|\{\{[^}]*\}\}|<[^>]*>").expect("valid placeholder regex"));

// Percent-encoded braces and angle brackets never appear in real doc links
static ENCODED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)%7B|%7D|%3C|%3E").expect("valid encoded placeholder regex"));

// Checks a discovered URL against the crawl rules
//
// Parameters:
//   url: the absolute URL as discovered (before normalization)
//   base_domain: host of the seed URL, e.g. "example.com"
//   patterns: the session's include/exclude patterns
//
// Returns: true if the URL may enter the frontier
//
// Example:
//   is_valid("https://example.com/docs/intro", "example.com", &p) -> true
//   is_valid("https://other.com/x", "example.com", &p)            -> false
//   is_valid("https://example.com/docs/${id}", "example.com", &p) -> false
pub fn is_valid(url: &str, base_domain: &str, patterns: &CrawlPatterns) -> bool {
    let raw = url.trim();
    if raw.is_empty() {
        return false;
    }

    // Rule 1: parseable, http(s)
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    // Rule 2: same site
    if !is_same_site(&parsed, base_domain) {
        return false;
    }

    // Rule 3: template placeholders, in the raw text and after parsing
    // (the parser percent-encodes '{' and '<' in paths)
    if has_placeholder(raw) || has_placeholder(parsed.as_str()) {
        return false;
    }

    // Rules 4 and 5: patterns are matched against the raw link so that
    // fragment-bearing links can be excluded
    if patterns.is_excluded(raw) {
        return false;
    }

    patterns.is_included(raw)
}

// True if the host equals base_domain or is one of its subdomains
//
// "docs.example.com" is a subdomain of "example.com",
// "badexample.com" is not.
pub fn is_same_site(url: &Url, base_domain: &str) -> bool {
    let base = base_domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if base.is_empty() {
        return false;
    }

    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == base || host.ends_with(&format!(".{}", base))
        }
        None => false,
    }
}

/// True if the text contains an unresolved template placeholder.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text) || ENCODED_PLACEHOLDER.is_match(text)
}
