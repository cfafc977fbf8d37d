// src/clean/structure.rs
// =============================================================================
// Stage 3: structural normalization.
//
// - setext headers ("Title\n=====") become ATX headers ("# Title")
// - headers deeper than level 4 are demoted to level 4
// - runs of blank lines outside code collapse to a single blank line
// - fences left open at the end of the page are closed
// - fenced blocks with nothing inside are dropped
// - table rows made only of empty cells are dropped
// - a horizontal rule that repeats the previous one is dropped
// - 8+ spaces of indentation outside code become 4
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_blank, is_header, Fences, LineKind};

const MAX_HEADER_LEVEL: usize = 4;

static DEEP_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}#{5,6}(\s|$)").expect("valid header regex"));

static EMPTY_TABLE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|(?:\s*\|)+\s*$").expect("valid table regex"));

static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s{0,3}(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").expect("valid rule regex")
});

static SETEXT_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}=+\s*$").expect("valid setext regex"));
static SETEXT_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}-+\s*$").expect("valid setext regex"));

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s").expect("valid list regex"));

pub(super) fn normalize_structure(text: &str) -> String {
    let lines = convert_setext_headers(text);

    let mut fences = Fences::default();
    let mut out: Vec<String> = Vec::new();
    // Lines of the fenced block currently open, fence line included
    let mut block: Vec<String> = Vec::new();
    let mut last_rule_index: Option<usize> = None;

    for line in &lines {
        match fences.classify(line) {
            LineKind::FenceOpen => {
                block.clear();
                block.push(line.to_string());
            }
            LineKind::Code => block.push(line.to_string()),
            LineKind::FenceClose => {
                block.push(line.to_string());
                flush_block(&mut block, &mut out);
            }
            LineKind::Text => {
                if is_blank(line) {
                    push_blank(&mut out);
                    continue;
                }
                if EMPTY_TABLE_ROW.is_match(line) {
                    continue;
                }
                if HORIZONTAL_RULE.is_match(line) {
                    // Only blank lines since the previous rule: drop the repeat
                    if let Some(index) = last_rule_index {
                        if out[index + 1..].iter().all(|l| is_blank(l)) {
                            continue;
                        }
                    }
                    last_rule_index = Some(out.len());
                    out.push(line.trim().to_string());
                    continue;
                }
                out.push(normalize_text_line(line));
            }
        }
    }

    // Page ended inside a code block: close it
    if let Some(marker) = fences.closing_marker() {
        while block.last().map_or(false, |l| is_blank(l)) {
            block.pop();
        }
        block.push(marker);
        flush_block(&mut block, &mut out);
    }

    out.join("\n")
}

fn normalize_text_line(line: &str) -> String {
    if DEEP_HEADER.is_match(line) {
        let trimmed = line.trim_start();
        let rest = trimmed.trim_start_matches('#');
        return format!("{}{}", "#".repeat(MAX_HEADER_LEVEL), rest);
    }

    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent >= 8 {
        return format!("    {}", &line[indent..]);
    }

    line.to_string()
}

// Emits a finished fenced block unless it holds only blank lines.
// Code is kept line for line; blank lines inside it may be significant.
fn flush_block(block: &mut Vec<String>, out: &mut Vec<String>) {
    let has_code = block.len() > 2 && block[1..block.len() - 1].iter().any(|l| !is_blank(l));
    if has_code {
        out.extend(block.drain(..).map(|line| line.trim_end().to_string()));
    }
    block.clear();
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().map_or(false, |l| !is_blank(l)) {
        out.push(String::new());
    }
}

// "Title\n=====" -> "# Title", "Section\n-------" -> "## Section"
//
// The underline only counts after a plain paragraph line; "---" after a
// blank line, a list item or a header stays a horizontal rule.
fn convert_setext_headers(text: &str) -> Vec<String> {
    let mut fences = Fences::default();
    let mut out: Vec<String> = Vec::new();
    let mut previous_is_paragraph = false;

    for line in text.lines() {
        if fences.classify(line) != LineKind::Text {
            out.push(line.to_string());
            previous_is_paragraph = false;
            continue;
        }

        if previous_is_paragraph {
            let level = if SETEXT_H1.is_match(line) {
                Some(1)
            } else if SETEXT_H2.is_match(line) {
                Some(2)
            } else {
                None
            };

            if let Some(level) = level {
                if let Some(title) = out.pop() {
                    out.push(format!("{} {}", "#".repeat(level), title.trim()));
                }
                previous_is_paragraph = false;
                continue;
            }
        }

        previous_is_paragraph = is_paragraph_line(line);
        out.push(line.to_string());
    }

    out
}

fn is_paragraph_line(line: &str) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    let trimmed = line.trim();

    !trimmed.is_empty()
        && indent < 4
        && !is_header(line)
        && !LIST_ITEM.is_match(line)
        && !HORIZONTAL_RULE.is_match(line)
        && !trimmed.starts_with('>')
        && !trimmed.starts_with('|')
        && !SETEXT_H1.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_headers_are_clamped() {
        assert_eq!(normalize_structure("##### Five\n###### Six"), "#### Five\n#### Six");
        assert_eq!(normalize_structure("#### Four"), "#### Four");
    }

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(normalize_structure("a\n\n\n\nb\n  \n\t\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_setext_headers() {
        assert_eq!(normalize_structure("Title\n=====\ntext"), "# Title\ntext");
        assert_eq!(normalize_structure("Section\n---\ntext"), "## Section\ntext");
        // After a blank line "---" is a rule
        assert_eq!(normalize_structure("text\n\n---\nmore"), "text\n\n---\nmore");
        assert_eq!(normalize_structure("- item\n---"), "- item\n---");
    }

    #[test]
    fn test_unterminated_fence_is_closed() {
        assert_eq!(normalize_structure("~~~~\ncode\n\n"), "~~~~\ncode\n~~~~");
        assert_eq!(normalize_structure("```\n\n\n"), "");
    }

    #[test]
    fn test_blank_runs_inside_code_are_kept() {
        let text = "intro\n\n\n```python\ndef a():\n    pass\n\n\ndef b():\n    pass\n```";
        assert_eq!(
            normalize_structure(text),
            "intro\n\n```python\ndef a():\n    pass\n\n\ndef b():\n    pass\n```"
        );
    }

    #[test]
    fn test_empty_code_blocks_are_dropped() {
        assert_eq!(normalize_structure("before\n```js\n\n```\nafter"), "before\nafter");
    }

    #[test]
    fn test_code_blocks_keep_their_content() {
        let text = "```\n##### not a header\n          indented\n```";
        assert_eq!(normalize_structure(text), text);
    }

    #[test]
    fn test_empty_table_rows_are_dropped() {
        let text = "| a | b |\n|---|---|\n|   |   |\n| 1 | 2 |";
        assert_eq!(normalize_structure(text), "| a | b |\n|---|---|\n| 1 | 2 |");
    }

    #[test]
    fn test_repeated_rules_collapse() {
        assert_eq!(normalize_structure("a\n\n---\n\n***\n\n- - -\nb"), "a\n\n---\n\nb");
        assert_eq!(normalize_structure("---\ntext\n\n---"), "---\ntext\n\n---");
    }

    #[test]
    fn test_deep_indentation_is_reduced() {
        assert_eq!(normalize_structure("           deep\n    four"), "    deep\n    four");
    }
}
