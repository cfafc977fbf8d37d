// src/clean/mod.rs
// =============================================================================
// This module turns raw page markdown into clean, LLM-friendly markdown.
//
// The pipeline has four stages, applied in order:
// 1. noise      - drop UI boilerplate lines ("Skip to content", "Edit this page")
// 2. links      - make relative links absolute, drop empty/javascript links
// 3. structure  - clamp header depth, collapse blank runs, close open fences
// 4. spacing    - one blank line around headers and code blocks
//
// Every stage is a plain `&str -> String` function: no I/O, no errors.
// Malformed markdown (unbalanced fences, stray HTML) is treated as text.
//
// Cleaning must be idempotent: clean(clean(x)) == clean(x). Some rewrites
// expose new work for an earlier stage (a link line that turns out empty,
// a setext header that becomes "## On this page"), so the pipeline is
// repeated until the text stops changing.
// =============================================================================

mod links;
mod noise;
mod spacing;
mod structure;

use url::Url;

/// Upper bound on pipeline passes; real pages settle in two.
const MAX_PASSES: usize = 8;

/// Cleans markdown without a page URL (relative links are left as they are).
pub fn clean(raw: &str) -> String {
    run(raw, None)
}

/// Cleans markdown fetched from `base`, resolving relative links against it.
pub fn clean_with_base(raw: &str, base: &Url) -> String {
    run(raw, Some(base))
}

fn run(raw: &str, base: Option<&Url>) -> String {
    let mut current = raw.replace("\r\n", "\n").replace(['\r', '\u{a0}'], " ");

    for _ in 0..MAX_PASSES {
        let next = pass(&current, base);
        if next == current {
            break;
        }
        current = next;
    }

    current
}

fn pass(text: &str, base: Option<&Url>) -> String {
    let text = noise::strip_noise(text);
    let text = links::rewrite_links(&text, base);
    let text = structure::normalize_structure(&text);
    spacing::apply_spacing(&text)
}

// -----------------------------------------------------------------------------
// Code fences
//
// Every stage must leave fenced code alone, so they share this tracker.
// Feed it each line in order; it says whether the line is prose, a fence
// marker, or code inside a fence.
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Text,
    FenceOpen,
    Code,
    FenceClose,
}

#[derive(Debug, Default)]
pub(crate) struct Fences {
    open: Option<(char, usize)>,
}

impl Fences {
    pub(crate) fn classify(&mut self, line: &str) -> LineKind {
        match (self.open, fence_marker(line)) {
            (None, Some((ch, len, _))) => {
                self.open = Some((ch, len));
                LineKind::FenceOpen
            }
            (None, None) => LineKind::Text,
            (Some((open_ch, open_len)), Some((ch, len, info)))
                if ch == open_ch && len >= open_len && info.is_empty() =>
            {
                self.open = None;
                LineKind::FenceClose
            }
            (Some(_), _) => LineKind::Code,
        }
    }

    /// The marker that would close the currently open fence.
    pub(crate) fn closing_marker(&self) -> Option<String> {
        self.open.map(|(ch, len)| std::iter::repeat(ch).take(len).collect())
    }
}

// "```rust" -> ('`', 3, "rust"), "~~~~" -> ('~', 4, "")
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > 3 {
        return None;
    }

    let ch = rest.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }

    // Both marker characters are ASCII, so the char count is also a byte offset
    let len = rest.chars().take_while(|&c| c == ch).count();
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim();
    if ch == '`' && info.contains('`') {
        return None;
    }
    Some((ch, len, info))
}

/// True for lines that are empty or only whitespace.
pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// True for ATX header lines ("# Title", "### Usage").
pub(crate) fn is_header(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && trimmed[hashes..].chars().next().map_or(true, char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_to_content_scenario() {
        let raw = "# Title\n\n\n\n\nSkip to content\n\nReal content here.";
        assert_eq!(clean(raw), "# Title\n\nReal content here.");
    }

    #[test]
    fn test_full_page() {
        let raw = "Skip to main content\n\
                   [Edit this page](https://github.com/acme/docs/edit/main/intro.md)\n\
                   ###### Deep Header\n\
                   Read the [setup guide](../setup) first.   \n\
                   \n\n\n\
                   ```bash\n\
                   npm install\n\
                   ```\n\
                   Last updated on Jan 5, 2024";
        let base = Url::parse("https://example.com/docs/guide/intro").unwrap();

        assert_eq!(
            clean_with_base(raw, &base),
            "#### Deep Header\n\n\
             Read the [setup guide](https://example.com/docs/setup) first.\n\n\
             ```bash\nnpm install\n```"
        );
    }

    #[test]
    fn test_unterminated_fence_is_closed() {
        let cleaned = clean("Intro text\n```python\nprint('hi')\n\n\n");
        assert_eq!(cleaned, "Intro text\n\n```python\nprint('hi')\n```");
    }

    #[test]
    fn test_code_is_not_treated_as_noise() {
        let raw = "```\nSearch\n# not a header\n###### still code\n```";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn test_blank_lines_in_code_survive_cleaning() {
        let raw = "Example:\n\n```python\nimport os\n\n\ndef main():   \n    pass\n```";
        let cleaned = clean(raw);
        assert_eq!(cleaned, "Example:\n\n```python\nimport os\n\n\ndef main():\n    pass\n```");
        assert_eq!(clean(&cleaned), cleaned);
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        let inputs = [
            "",
            "```",
            "~~~~\n```\n",
            "<div><p>stray html",
            "[unclosed](link",
            "](",
            "######",
            "\u{a0}\u{a0}\r\n\r\n#",
            "é```\n        ü",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_idempotent_and_no_double_blank_lines() {
        let samples = [
            "Title\n=====\n\n\n\nOn this page\n-------\n\ntext",
            "- [Intro](#intro)\n- [Usage](#usage)\n\n## Intro\n\n\n\nBody [¶](#intro)",
            "---\n\n---\n\n| a | b |\n|---|---|\n|  |  |\n| 1 | 2 |",
            "           deeply indented\n\n```\n\n\n```\nafter",
            "# A\n## B\n```\ncode\n```\n# C\ntext   ",
            "Next →\n\n← Previous\n\n[Home](/)\n\nCopy\n\nreal words here",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {:?}", sample);
            assert!(!once.contains("\n\n\n"), "double blank line in {:?}", once);
        }
    }

    #[test]
    fn test_fence_classification() {
        let mut fences = Fences::default();
        assert_eq!(fences.classify("text"), LineKind::Text);
        assert_eq!(fences.classify("````rust"), LineKind::FenceOpen);
        assert_eq!(fences.classify("```"), LineKind::Code);
        assert_eq!(fences.closing_marker().as_deref(), Some("````"));
        assert_eq!(fences.classify("````"), LineKind::FenceClose);
        assert_eq!(fences.classify("~~~"), LineKind::FenceOpen);
        assert_eq!(fences.classify("~~~"), LineKind::FenceClose);
        assert_eq!(fences.classify("    ```"), LineKind::Text);
    }

    #[test]
    fn test_is_header() {
        assert!(is_header("# Title"));
        assert!(is_header("###### Six"));
        assert!(is_header("##"));
        assert!(!is_header("#hashtag"));
        assert!(!is_header("####### seven"));
        assert!(!is_header("    # indented code"));
    }
}
