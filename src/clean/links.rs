// src/clean/links.rs
// =============================================================================
// Stage 2: link processing.
//
// For every markdown link or image outside code fences:
//   [text](relative)      -> [text](absolute)      (when the page URL is known)
//   [text](javascript:..) -> text
//   [text](#section)      -> text                  (in-page anchors are useless
//                                                    once pages are merged)
//   [](target), [¶](..)   -> removed               (no meaningful text)
//   ![alt](relative)      -> ![alt](absolute)
//
// Absolute targets are written back exactly as found, so a second pass
// never rewrites them again. A line that only held dropped links is
// removed as well.
// =============================================================================

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use super::{Fences, LineKind};

// (1) "!" for images, (2) text, (3) target (one level of parens allowed), optional "title"
static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(\s*((?:[^()\s]|\([^()\s]*\))*)(?:\s+"[^"]*")?\s*\)"#)
        .expect("valid markdown link regex")
});

pub(super) fn rewrite_links(text: &str, base: Option<&Url>) -> String {
    let mut fences = Fences::default();
    let mut out: Vec<String> = Vec::new();

    for line in text.lines() {
        if fences.classify(line) != LineKind::Text || !line.contains("](") {
            out.push(line.to_string());
            continue;
        }

        let rewritten = LINK.replace_all(line, |caps: &Captures| rewrite_one(caps, base));

        // The line was nothing but links that all went away
        if rewritten.trim().is_empty() {
            continue;
        }
        out.push(rewritten.into_owned());
    }

    out.join("\n")
}

fn rewrite_one(caps: &Captures, base: Option<&Url>) -> String {
    let is_image = !caps[1].is_empty();
    let text = &caps[2];
    let target = &caps[3];

    if is_image {
        if target.is_empty() {
            return String::new();
        }
        return format!("![{}]({})", text, absolutize(target, base));
    }

    let meaningful = has_meaningful_text(text);
    let lowered = target.to_ascii_lowercase();

    if lowered.starts_with("javascript:") || target.starts_with('#') || target.is_empty() {
        return if meaningful { text.trim().to_string() } else { String::new() };
    }

    if !meaningful {
        return String::new();
    }

    format!("[{}]({})", text, absolutize(target, base))
}

// Link text counts when it has at least one letter or digit
// ("¶", "#", "→", "" do not)
fn has_meaningful_text(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

fn absolutize(target: &str, base: Option<&Url>) -> String {
    if Url::parse(target).is_ok() {
        return target.to_string();
    }

    match base.and_then(|base| base.join(target).ok()) {
        Some(resolved) => resolved.to_string(),
        None => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/guide/intro").unwrap()
    }

    #[test]
    fn test_relative_links_become_absolute() {
        let text = "See [setup](../setup) and [api](/api/v1) and [same](install#step-2).";
        assert_eq!(
            rewrite_links(text, Some(&base())),
            "See [setup](https://example.com/docs/setup) and [api](https://example.com/api/v1) \
             and [same](https://example.com/docs/guide/install#step-2)."
        );
    }

    #[test]
    fn test_absolute_links_are_untouched() {
        let text = "[Rust](https://www.rust-lang.org) and [mail](mailto:a@b.c)";
        assert_eq!(rewrite_links(text, Some(&base())), text);
    }

    #[test]
    fn test_without_base_relative_links_stay() {
        assert_eq!(rewrite_links("[setup](../setup)", None), "[setup](../setup)");
    }

    #[test]
    fn test_javascript_and_anchor_links_keep_text() {
        assert_eq!(
            rewrite_links("Click [open menu](javascript:void(0)) or see [Usage](#usage).", None),
            "Click open menu or see Usage."
        );
    }

    #[test]
    fn test_symbolic_links_are_dropped() {
        assert_eq!(rewrite_links("## Install [¶](#install)", None), "## Install ");
        assert_eq!(rewrite_links("Text [](https://example.com/x) more", None), "Text  more");
        assert_eq!(rewrite_links("before\n[#](https://example.com/x)\nafter", None), "before\nafter");
    }

    #[test]
    fn test_images_are_resolved() {
        assert_eq!(
            rewrite_links("![Diagram](img/flow.png \"Flow\")", Some(&base())),
            "![Diagram](https://example.com/docs/guide/img/flow.png)"
        );
        assert_eq!(rewrite_links("![broken]()", None), "");
    }

    #[test]
    fn test_code_blocks_are_untouched() {
        let text = "```\n[x](javascript:go())\n```";
        assert_eq!(rewrite_links(text, None), text);
    }
}
