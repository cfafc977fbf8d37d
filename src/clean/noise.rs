// src/clean/noise.rs
// =============================================================================
// Stage 1: drop UI boilerplate lines.
//
// Documentation themes surround the real content with widgets: skip links,
// "Edit this page", search boxes, cookie banners, prev/next arrows. After
// HTML -> markdown conversion these become short standalone lines.
//
// A line is noise when, after stripping markdown decoration:
// - it IS one of the known phrases ("Skip to content", "Copy", "Search")
// - it STARTS with a known prefix ("Last updated ...") and is short and not
//   prose (prose = long, or more than one sentence)
// - it is a copyright / "All rights reserved" footer
// - it is only navigation arrows, only anchor links (a page TOC), or an
//   empty list marker
//
// A longer sentence that merely mentions "search" or "cookies" is kept.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Fences, LineKind};

/// Lines that are noise when they match exactly (case-insensitive,
/// after decoration and trailing punctuation are stripped).
const NOISE_PHRASES: &[&str] = &[
    "skip to content",
    "skip to main content",
    "skip to navigation",
    "skip navigation",
    "edit this page",
    "edit page",
    "edit on github",
    "view source",
    "view page source",
    "search",
    "search docs",
    "search documentation",
    "search the docs",
    "table of contents",
    "on this page",
    "in this article",
    "in this section",
    "cookie notice",
    "accept cookies",
    "accept all cookies",
    "back to top",
    "scroll to top",
    "copy",
    "copied",
    "copy code",
    "copy to clipboard",
    "share",
    "print",
    "menu",
    "main menu",
    "navigation",
    "main navigation",
    "toggle navigation",
    "toggle menu",
    "toggle sidebar",
    "close",
    "loading",
    "previous",
    "prev",
    "next",
    "previous page",
    "next page",
    "show more",
    "show less",
    "expand all",
    "collapse all",
    "light mode",
    "dark mode",
    "toggle theme",
    "feedback",
    "was this page helpful",
    "was this helpful",
    "thank you for your feedback",
    "report an issue",
    "ask ai",
];

/// Lines that are noise when they start with one of these and are short.
const NOISE_PREFIXES: &[&str] = &[
    "last updated",
    "last modified",
    "last edited",
    "edit this page",
    "we use cookies",
    "this site uses cookies",
    "this website uses cookies",
    "cookie",
    "powered by",
    "built with",
    "made with",
    "was this page helpful",
    "rate this page",
    "help us improve",
    "subscribe to our newsletter",
    "previous:",
    "next:",
    "on this page",
];

/// Prefix phrases only apply to lines with at most this many words.
const SHORT_LINE_WORDS: usize = 10;

static LEGAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:copyright\s*)?(?:©|\(c\))|^copyright\s+\d{4}|all rights reserved")
        .expect("valid legal-notice regex")
});

static ONLY_ARROWS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s←→↑↓«»‹›|<>·•]+$").expect("valid arrow regex"));

static ARROW_EDGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[←«‹]\s*\S|\S\s*[→»›]$").expect("valid arrow-edge regex"));

static ANCHOR_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+]\s+|\d+[.)]\s+)?(?:\[[^\]]*\]\(#[^)]*\)\s*)+$").expect("valid anchor-line regex")
});

static EMPTY_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]|\d+[.)])$").expect("valid list-marker regex"));

static SINGLE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!?\[([^\]]*)\]\([^)]*\)$").expect("valid single-link regex"));

// Removes noise lines outside code fences
pub(super) fn strip_noise(text: &str) -> String {
    let mut fences = Fences::default();
    let mut kept: Vec<&str> = Vec::new();

    for line in text.lines() {
        let keep = match fences.classify(line) {
            LineKind::Text => !is_noise_line(line),
            _ => true,
        };
        if keep {
            kept.push(line);
        }
    }

    kept.join("\n")
}

pub(super) fn is_noise_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }

    if EMPTY_LIST_MARKER.is_match(trimmed) || ANCHOR_ONLY.is_match(trimmed) || ONLY_ARROWS.is_match(trimmed) {
        return true;
    }

    let words = trimmed.split_whitespace().count();
    if words <= 8 && ARROW_EDGE.is_match(trimmed) {
        return true;
    }

    let normalized = normalize(trimmed);
    if normalized.is_empty() {
        return false;
    }

    if NOISE_PHRASES.contains(&normalized.as_str()) {
        return true;
    }

    if words <= 15 && LEGAL.is_match(&normalized) {
        return true;
    }

    words <= SHORT_LINE_WORDS
        && !is_prose(trimmed)
        && NOISE_PREFIXES.iter().any(|prefix| normalized.starts_with(prefix))
}

// "## **Edit this page:**" -> "edit this page"
// "- [Next](/docs/b)"      -> "next"
fn normalize(line: &str) -> String {
    let stripped = line.trim_start_matches(|c: char| matches!(c, '#' | '>' | '-' | '*' | '+') || c.is_whitespace());

    let text = match SINGLE_LINK.captures(stripped) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => stripped,
    };

    text.trim_matches(|c: char| matches!(c, '*' | '_' | '`') || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '.' | '…' | ':' | '!' | '?') || c.is_whitespace())
        .to_lowercase()
}

// A line reads as prose when it holds more than one complete sentence
fn is_prose(line: &str) -> bool {
    let chars: Vec<char> = line.trim_end().chars().collect();
    let ends_sentence = matches!(chars.last(), Some('.' | '!' | '?'));
    ends_sentence
        && chars
            .windows(2)
            .enumerate()
            .any(|(i, pair)| matches!(pair[0], '.' | '!' | '?') && pair[1] == ' ' && i + 2 < chars.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_phrases() {
        for line in [
            "Skip to content",
            "  SKIP TO MAIN CONTENT  ",
            "Search...",
            "Search…",
            "## On this page",
            "**Copied!**",
            "[Edit this page](https://github.com/acme/docs/edit/main/a.md)",
            "- [Next](/docs/b)",
        ] {
            assert!(is_noise_line(line), "expected noise: {:?}", line);
        }
    }

    #[test]
    fn test_prose_mentioning_phrases_is_kept() {
        for line in [
            "Use the search box to find commands by name.",
            "Search results are cached for five minutes, so new pages appear with a delay.",
            "Copy the binary to your PATH.",
            "Next, configure the server. Then restart it.",
        ] {
            assert!(!is_noise_line(line), "expected prose: {:?}", line);
        }
        assert!(is_noise_line("# Search"));
    }

    #[test]
    fn test_prefix_phrases_need_short_lines() {
        assert!(is_noise_line("Last updated on Jan 5, 2024"));
        assert!(is_noise_line("Was this page helpful? Yes No"));
        assert!(!is_noise_line(
            "Last updated versions of the client library changed how retries are configured for streams."
        ));
        assert!(!is_noise_line("Cookie handling is automatic. Sessions are stored server side."));
    }

    #[test]
    fn test_legal_and_navigation_lines() {
        assert!(is_noise_line("© 2024 Acme Inc. All rights reserved."));
        assert!(is_noise_line("Copyright 2023, The Acme Authors"));
        assert!(is_noise_line("← Installation"));
        assert!(is_noise_line("Configuration →"));
        assert!(is_noise_line("« | »"));
        assert!(is_noise_line("-"));
        assert!(is_noise_line("3."));
        assert!(is_noise_line("- [Intro](#intro)"));
        assert!(is_noise_line("[Intro](#intro) [Usage](#usage)"));
        assert!(!is_noise_line("See [Intro](#intro) for details."));
        assert!(!is_noise_line("Returns a value -> used by callers →  that"));
    }

    #[test]
    fn test_strip_noise_leaves_code_alone() {
        let text = "Intro\n```\nCopy\n```\nCopy";
        assert_eq!(strip_noise(text), "Intro\n```\nCopy\n```");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("## **Edit this page:**"), "edit this page");
        assert_eq!(normalize("> _Back to top_"), "back to top");
        assert_eq!(normalize("- [Next](/docs/b)"), "next");
    }
}
