// src/chunk/boundaries.rs
// =============================================================================
// Where a chunk is allowed to start.
//
// Every line start (except the first) is a candidate. Each one is tagged:
//   Header    - the line is a markdown header
//   Paragraph - the line follows a blank line
//   Line      - any other line start
// and flagged when it falls inside a fenced code block, where semantic
// splitting must never cut.
// =============================================================================

use crate::clean::{is_blank, is_header, Fences, LineKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Header,
    Paragraph,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset of the line start (always a char boundary)
    pub byte: usize,
    /// Number of chars before this offset
    pub chars: usize,
    pub kind: BoundaryKind,
    pub in_code: bool,
}

impl Boundary {
    /// The start of the text.
    pub const START: Boundary = Boundary {
        byte: 0,
        chars: 0,
        kind: BoundaryKind::Paragraph,
        in_code: false,
    };

    /// Allowed when splitting on headers and paragraphs only.
    pub fn is_semantic(&self) -> bool {
        !self.in_code && self.kind != BoundaryKind::Line
    }
}

/// All candidate split points of `text`, in order.
pub fn find_boundaries(text: &str) -> Vec<Boundary> {
    let mut fences = Fences::default();
    let mut boundaries = Vec::new();
    let mut byte = 0usize;
    let mut chars = 0usize;
    let mut previous_blank = false;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let line_kind = fences.classify(content);

        if byte > 0 {
            let in_code = matches!(line_kind, LineKind::Code | LineKind::FenceClose);
            let kind = if in_code {
                BoundaryKind::Line
            } else if is_header(content) {
                BoundaryKind::Header
            } else if previous_blank && !is_blank(content) {
                BoundaryKind::Paragraph
            } else {
                BoundaryKind::Line
            };
            boundaries.push(Boundary { byte, chars, kind, in_code });
        }

        previous_blank = is_blank(content);
        byte += line.len();
        chars += line.chars().count();
    }

    boundaries
}
