// src/crawl/patterns.rs
// =============================================================================
// Include / exclude URL patterns and the "documentation shape" detector.
//
// CrawlPatterns is plain data: two lists of compiled regexes. It is built
// once per crawl (from the config, or detected from the seed URL) and then
// only read by the validator.
//
// Detection looks at the seed's path segments:
//   https://example.com/en/docs/getting-started
//                          ^^^^ "docs" is a documentation indicator
// -> include: anything under /en/docs
//
// With no indicator we stay under the seed's directory instead:
//   https://example.com/learn/intro.html -> include anything under /learn
//
// Exclusions are always the same list of non-content resources.
// =============================================================================

use regex::{Regex, RegexBuilder};
use url::Url;

use crate::error::ConfigError;

/// Path segments that usually mark the root of a documentation tree.
const DOC_INDICATORS: &[&str] = &[
    "docs",
    "doc",
    "documentation",
    "guide",
    "guides",
    "manual",
    "help",
    "wiki",
    "api",
    "reference",
    "tutorial",
    "tutorials",
];

/// Default exclude patterns: account pages, listings, binaries and assets,
/// fragment links, pagination and unresolved template placeholders.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    r"/(?:login|logout|register|signup|signin|cart|checkout|account|profile|admin|dashboard|settings)(?:[/?#._-]|$)",
    r"/(?:search|tag|tags|category|categories)(?:[/?#]|$)",
    r"/(?:_images|images|img|assets|static|media|downloads)/",
    r"\.(?:pdf|zip|tar|gz|tgz|bz2|xz|7z|rar|exe|dmg|pkg|msi|deb|rpm|iso)(?:[?#]|$)",
    r"\.(?:png|jpe?g|gif|svg|webp|ico|bmp|css|js|json|xml|woff2?|ttf|eot|mp3|mp4|webm|avi|mov)(?:[?#]|$)",
    r"#",
    r"[?&](?:page|p)=\d*",
    r"\$\{.*\}",
    r"\{\{.*\}\}",
    r"%7[bB].*%7[dD]",
    r"/\*",
];

/// Compiled include/exclude patterns, shared read-only for a crawl session.
#[derive(Debug, Clone, Default)]
pub struct CrawlPatterns {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl CrawlPatterns {
    /// Compiles the given pattern strings. Matching is case-insensitive and
    /// unanchored (a pattern matches if it is found anywhere in the URL).
    pub fn compile<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Uses the caller's patterns where given and detected ones otherwise.
    ///
    /// An empty include list means "detect from the seed"; an empty exclude
    /// list means "use DEFAULT_EXCLUDES".
    pub fn resolve(seed: &Url, include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let detected = detect_patterns(seed);
        Ok(Self {
            include: if include.is_empty() { detected.include } else { compile_all(include)? },
            exclude: if exclude.is_empty() { detected.exclude } else { compile_all(exclude)? },
        })
    }

    pub fn include(&self) -> &[Regex] {
        &self.include
    }

    pub fn exclude(&self) -> &[Regex] {
        &self.exclude
    }

    /// True if any exclude pattern matches.
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclude.iter().any(|pattern| pattern.is_match(url))
    }

    /// True if there are no include patterns, or at least one matches.
    pub fn is_included(&self, url: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|pattern| pattern.is_match(url))
    }

    /// Pattern sources, for logs and the metadata record.
    pub fn describe(&self) -> (Vec<String>, Vec<String>) {
        (
            self.include.iter().map(|p| p.as_str().to_string()).collect(),
            self.exclude.iter().map(|p| p.as_str().to_string()).collect(),
        )
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_one(p.as_ref())).collect()
}

fn compile_one(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

// Infers include/exclude patterns from the seed URL
//
// Parameters:
//   seed: the URL the crawl starts from
//
// Returns: CrawlPatterns with
//   include = the documentation subtree (or the seed's directory), empty
//             when the seed is the site root (everything on the host)
//   exclude = DEFAULT_EXCLUDES
pub fn detect_patterns(seed: &Url) -> CrawlPatterns {
    let include = subtree_prefix(seed)
        .map(|prefix| vec![prefix_pattern(&prefix)])
        .unwrap_or_default();

    // Both lists are built from constants and escaped segments, so they
    // always compile.
    CrawlPatterns {
        include: include.iter().filter_map(|p| compile_one(p).ok()).collect(),
        exclude: DEFAULT_EXCLUDES.iter().filter_map(|p| compile_one(p).ok()).collect(),
    }
}

// Finds the path prefix the crawl should stay under, e.g. "/en/docs"
fn subtree_prefix(seed: &Url) -> Option<String> {
    let segments: Vec<&str> = seed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    // Documentation indicator: keep everything up to and including it
    if let Some(pos) = segments.iter().position(|seg| is_doc_indicator(seg)) {
        return Some(format!("/{}", segments[..=pos].join("/")));
    }

    // Otherwise stay under the seed's directory. A last segment that looks
    // like a file ("intro.html") is not a directory.
    let dir_len = match segments.last() {
        Some(last) if last.contains('.') && !seed.path().ends_with('/') => segments.len() - 1,
        Some(_) => segments.len(),
        None => 0,
    };

    if dir_len == 0 {
        None
    } else {
        Some(format!("/{}", segments[..dir_len].join("/")))
    }
}

// "docs", "user_guide", "api-reference" all count as indicators
fn is_doc_indicator(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    lower
        .split(|c: char| c == '-' || c == '_' || c == '.')
        .any(|token| DOC_INDICATORS.contains(&token))
}

// Pattern matching "<any scheme>://<any host><prefix>" followed by the end
// of the path, a slash, or a query
fn prefix_pattern(prefix: &str) -> String {
    format!(r"^[a-z][a-z0-9+.-]*://[^/]+{}(?:[/?#]|$)", regex::escape(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(seed: &str) -> CrawlPatterns {
        detect_patterns(&Url::parse(seed).unwrap())
    }

    #[test]
    fn test_detects_docs_subtree() {
        let patterns = detect("https://example.com/en/docs/getting-started");
        assert!(patterns.is_included("https://example.com/en/docs/intro"));
        assert!(patterns.is_included("https://example.com/en/docs"));
        assert!(!patterns.is_included("https://example.com/en/blog/post"));
        assert!(!patterns.is_included("https://example.com/en/docsearch"));
    }

    #[test]
    fn test_detects_compound_indicator() {
        let patterns = detect("https://example.com/ansible/latest/user_guide/index.html");
        assert!(patterns.is_included("https://example.com/ansible/latest/user_guide/basics"));
        assert!(!patterns.is_included("https://example.com/ansible/latest/other"));
    }

    #[test]
    fn test_falls_back_to_seed_directory() {
        let patterns = detect("https://example.com/learn/intro.html");
        assert!(patterns.is_included("https://example.com/learn/next.html"));
        assert!(!patterns.is_included("https://example.com/pricing"));
    }

    #[test]
    fn test_root_seed_includes_everything() {
        let patterns = detect("https://example.com/");
        assert!(patterns.include().is_empty());
        assert!(patterns.is_included("https://example.com/anything"));
    }

    #[test]
    fn test_default_excludes() {
        let patterns = detect("https://example.com/docs/");
        for url in [
            "https://example.com/docs/login",
            "https://example.com/docs/admin/users",
            "https://example.com/docs/manual.pdf",
            "https://example.com/docs/_images/diagram.svg",
            "https://example.com/docs/intro#setup",
            "https://example.com/docs/changelog?page=2",
            "https://example.com/docs/${path}",
        ] {
            assert!(patterns.is_excluded(url), "expected {} to be excluded", url);
        }
        assert!(!patterns.is_excluded("https://example.com/docs/installation"));
        assert!(!patterns.is_excluded("https://example.com/docs/catalog-format"));
    }

    #[test]
    fn test_resolve_prefers_caller_patterns() {
        let seed = Url::parse("https://example.com/docs/").unwrap();
        let patterns = CrawlPatterns::resolve(&seed, &[r"/guide/".to_string()], &[]).unwrap();
        assert!(patterns.is_included("https://example.com/guide/x"));
        assert!(!patterns.is_included("https://example.com/docs/x"));
        assert!(patterns.is_excluded("https://example.com/guide/login"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let result = CrawlPatterns::compile(&["(unclosed"], &[]);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let patterns = CrawlPatterns::compile(&["/DOCS/"], &[]).unwrap();
        assert!(patterns.is_included("https://example.com/docs/x"));
    }
}
