// src/clean/spacing.rs
// =============================================================================
// Stage 4: spacing for LLM consumption.
//
// - exactly one blank line before and after every header
// - exactly one blank line before and after every fenced code block
// - no trailing whitespace on any line
// - lines inside fenced code are otherwise left as they are
// - no blank lines at the start or end of the document
// =============================================================================

use super::{is_header, Fences, LineKind};

pub(super) fn apply_spacing(text: &str) -> String {
    let mut fences = Fences::default();
    let mut out: Vec<&str> = Vec::new();
    // The previous element (header or closing fence) wants a blank line after it
    let mut blank_after = false;

    for line in text.lines().map(str::trim_end) {
        match fences.classify(line) {
            LineKind::Code => out.push(line),
            LineKind::FenceOpen => {
                push_blank(&mut out);
                out.push(line);
                blank_after = false;
            }
            LineKind::FenceClose => {
                out.push(line);
                blank_after = true;
            }
            LineKind::Text if line.is_empty() => {
                push_blank(&mut out);
                blank_after = false;
            }
            LineKind::Text => {
                if blank_after || is_header(line) {
                    push_blank(&mut out);
                }
                out.push(line);
                blank_after = is_header(line);
            }
        }
    }

    while out.last().map_or(false, |l| l.is_empty()) {
        out.pop();
    }

    out.join("\n")
}

fn push_blank(out: &mut Vec<&str>) {
    if out.last().map_or(false, |l| !l.is_empty()) {
        out.push("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_get_blank_lines() {
        assert_eq!(apply_spacing("intro\n## Usage\ntext"), "intro\n\n## Usage\n\ntext");
        assert_eq!(apply_spacing("# A\n## B"), "# A\n\n## B");
    }

    #[test]
    fn test_code_blocks_get_blank_lines() {
        assert_eq!(
            apply_spacing("Run:\n```sh\nmake\n\n\nmake test\n```\nDone."),
            "Run:\n\n```sh\nmake\n\n\nmake test\n```\n\nDone."
        );
    }

    #[test]
    fn test_trailing_whitespace_and_edges() {
        assert_eq!(apply_spacing("\n\n  text  \nmore\t\n\n\n"), "  text\nmore");
    }

    #[test]
    fn test_existing_blank_lines_are_not_doubled() {
        let text = "# Title\n\nBody\n\n```\ncode\n```\n\nEnd";
        assert_eq!(apply_spacing(text), text);
    }
}
