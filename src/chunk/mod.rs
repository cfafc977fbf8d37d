// src/chunk/mod.rs
// =============================================================================
// This module splits the crawled corpus into chunks that fit an LLM context.
//
// How it works:
// 1. Join the cleaned content of every succeeded page (crawl order) with a
//    blank line between pages; remember where each page sits
// 2. Walk the corpus, cutting a chunk whenever the rest is larger than the
//    target size:
//    - semantic splitting: cut at the last header/paragraph start that keeps
//      the chunk between the minimum and the target size, preferring a
//      header in the second half; never inside a code block
//    - otherwise: cut at the first line start at/after the target size
// 3. A final piece smaller than the minimum is merged into the previous one
//
// Sizes use a simple estimate: 1 token ~ 4 characters.
//
// Chunks are contiguous slices: joining their contents gives back the
// corpus exactly. Same input + same options = same chunks.
// =============================================================================

mod boundaries;

pub use boundaries::{find_boundaries, Boundary, BoundaryKind};

use serde::{Deserialize, Serialize};

use crate::crawl::PageResult;

/// The token estimate: one token per this many characters.
pub const CHARS_PER_TOKEN: usize = 4;

/// Text placed between two pages in the corpus.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Estimated token count of `text` (rounded up).
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// How a chunk's end was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    /// The next chunk starts with a header
    Header,
    /// Cut because the chunk reached its size
    SizeLimit,
    /// The last chunk
    EndOfCorpus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    pub chunk_size_tokens: usize,
    /// Smallest chunk allowed (unless it is the only one)
    pub min_chunk_tokens: usize,
    pub semantic_splitting: bool,
}

impl ChunkOptions {
    /// Options with the default minimum of a quarter of the chunk size.
    pub fn new(chunk_size_tokens: usize, semantic_splitting: bool) -> Self {
        let chunk_size_tokens = chunk_size_tokens.max(1);
        Self {
            chunk_size_tokens,
            min_chunk_tokens: chunk_size_tokens / 4,
            semantic_splitting,
        }
    }

    pub fn with_min_chunk_tokens(mut self, min_chunk_tokens: usize) -> Self {
        self.min_chunk_tokens = min_chunk_tokens.min(self.chunk_size_tokens);
        self
    }
}

/// One piece of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 1-based position in the manifest
    #[serde(rename = "chunk_id")]
    pub index: usize,
    /// "chunk_001.md"
    pub filename: String,
    #[serde(skip)]
    pub content: String,
    pub word_count: usize,
    pub token_estimate: usize,
    /// URLs of the pages this chunk has text from, in corpus order
    #[serde(rename = "source_pages")]
    pub source_page_refs: Vec<String>,
    pub boundary_type: BoundaryType,
}

/// The chunk set and its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkManifest {
    pub chunk_size_tokens: usize,
    pub min_chunk_tokens: usize,
    pub semantic_splitting: bool,
    pub total_chunks: usize,
    pub total_words: usize,
    pub total_tokens: usize,
    pub chunks: Vec<Chunk>,
}

impl ChunkManifest {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Chunks the succeeded pages with the default minimum chunk size.
pub fn chunk(pages: &[PageResult], chunk_size_tokens: usize, semantic_splitting: bool) -> ChunkManifest {
    chunk_with(pages, &ChunkOptions::new(chunk_size_tokens, semantic_splitting))
}

pub fn chunk_with(pages: &[PageResult], options: &ChunkOptions) -> ChunkManifest {
    let corpus = Corpus::from_pages(pages);

    let chunks: Vec<Chunk> = split(corpus.text(), options)
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let content = corpus.text()[piece.start..piece.end].to_string();
            Chunk {
                index: i + 1,
                filename: format!("chunk_{:03}.md", i + 1),
                word_count: content.split_whitespace().count(),
                token_estimate: estimate_tokens(&content),
                source_page_refs: corpus.pages_in(piece.start, piece.end),
                boundary_type: piece.boundary,
                content,
            }
        })
        .collect();

    ChunkManifest {
        chunk_size_tokens: options.chunk_size_tokens,
        min_chunk_tokens: options.min_chunk_tokens,
        semantic_splitting: options.semantic_splitting,
        total_chunks: chunks.len(),
        total_words: chunks.iter().map(|c| c.word_count).sum(),
        total_tokens: chunks.iter().map(|c| c.token_estimate).sum(),
        chunks,
    }
}

/// The joined content of all succeeded pages.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    text: String,
    spans: Vec<PageSpan>,
}

#[derive(Debug, Clone)]
struct PageSpan {
    start: usize,
    end: usize,
    url: String,
}

impl Corpus {
    pub fn from_pages(pages: &[PageResult]) -> Self {
        let mut corpus = Corpus::default();

        for page in pages.iter().filter(|p| p.success() && !p.cleaned_content.trim().is_empty()) {
            if !corpus.text.is_empty() {
                corpus.text.push_str(PAGE_SEPARATOR);
            }
            let start = corpus.text.len();
            corpus.text.push_str(&page.cleaned_content);
            corpus.spans.push(PageSpan {
                start,
                end: corpus.text.len(),
                url: page.url.clone(),
            });
        }

        corpus
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// URLs of the pages overlapping the byte range `start..end`.
    pub fn pages_in(&self, start: usize, end: usize) -> Vec<String> {
        self.spans
            .iter()
            .filter(|span| span.start < end && start < span.end)
            .map(|span| span.url.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    start: usize,
    end: usize,
    boundary: BoundaryType,
}

fn split(text: &str, options: &ChunkOptions) -> Vec<Piece> {
    if text.is_empty() {
        return Vec::new();
    }

    let target = options.chunk_size_tokens.max(1) * CHARS_PER_TOKEN;
    let min = options.min_chunk_tokens.min(options.chunk_size_tokens) * CHARS_PER_TOKEN;
    let total_chars = text.chars().count();
    let boundaries = find_boundaries(text);

    let mut pieces = Vec::new();
    let mut start = Boundary::START;

    while total_chars - start.chars > target {
        let first = boundaries.partition_point(|b| b.byte <= start.byte);
        let candidates = &boundaries[first..];

        let cut = if options.semantic_splitting {
            pick_semantic(candidates, start.chars, target, min)
        } else {
            pick_line(candidates, start.chars, target)
        };

        match cut {
            Some(cut) => {
                let boundary = if cut.kind == BoundaryKind::Header {
                    BoundaryType::Header
                } else {
                    BoundaryType::SizeLimit
                };
                pieces.push(Piece {
                    start: start.byte,
                    end: cut.byte,
                    boundary,
                });
                start = cut;
            }
            // No acceptable split point left: the rest is one chunk
            None => break,
        }
    }

    pieces.push(Piece {
        start: start.byte,
        end: text.len(),
        boundary: BoundaryType::EndOfCorpus,
    });

    // A tail below the minimum joins the previous chunk
    if pieces.len() > 1 && total_chars - start.chars < min {
        if let Some(tail) = pieces.pop() {
            if let Some(previous) = pieces.last_mut() {
                previous.end = tail.end;
                previous.boundary = BoundaryType::EndOfCorpus;
            }
        }
    }

    pieces
}

// Semantic cut, in order of preference:
//   1. the last header start in [max(min, target/2), target]
//   2. the last header/paragraph start in [min, target]
//   3. the first header/paragraph start past min (oversized chunk, e.g. a
//      long code block with no break inside)
fn pick_semantic(candidates: &[Boundary], from: usize, target: usize, min: usize) -> Option<Boundary> {
    let usable = candidates.iter().filter(|b| b.is_semantic());
    let in_window = usable.clone().filter(|b| {
        let size = b.chars - from;
        size >= min && size <= target
    });

    in_window
        .clone()
        .filter(|b| b.kind == BoundaryKind::Header && b.chars - from >= target / 2)
        .last()
        .or_else(|| in_window.last())
        .or_else(|| usable.clone().find(|b| b.chars - from >= min))
        .copied()
}

// Plain cut: the first line start at or after the target size
fn pick_line(candidates: &[Boundary], from: usize, target: usize) -> Option<Boundary> {
    candidates.iter().find(|b| b.chars - from >= target).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::PageStatus;

    fn page(url: &str, content: &str) -> PageResult {
        PageResult {
            url: url.to_string(),
            depth: 0,
            title: "Page".to_string(),
            description: String::new(),
            raw_content: String::new(),
            cleaned_content: content.to_string(),
            word_count: content.split_whitespace().count(),
            status: PageStatus::Succeeded,
            error: None,
            discovered_links: Vec::new(),
        }
    }

    fn sample_pages() -> Vec<PageResult> {
        (0..6)
            .map(|p| {
                let body = (0..4)
                    .map(|s| {
                        format!(
                            "## Section {p}.{s}\n\nThis paragraph explains part {s} of page {p} in plain words.\n\
                             It goes on for a second line.\n\n```rust\nfn part_{s}() {{\n\n    println!(\"{p}\");\n}}\n```"
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                page(&format!("https://example.com/docs/p{}", p), &format!("# Page {}\n\n{}", p, body))
            })
            .collect()
    }

    fn joined(manifest: &ChunkManifest) -> String {
        manifest.chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_split_is_lossless() {
        let pages = sample_pages();
        let corpus = Corpus::from_pages(&pages);

        for semantic in [true, false] {
            for size in [1, 10, 40, 100, 10_000] {
                let manifest = chunk(&pages, size, semantic);
                assert_eq!(joined(&manifest), corpus.text(), "size {} semantic {}", size, semantic);
            }
        }
    }

    #[test]
    fn test_no_chunk_below_minimum() {
        let pages = sample_pages();
        for semantic in [true, false] {
            for size in [10, 40, 100] {
                let options = ChunkOptions::new(size, semantic);
                let manifest = chunk_with(&pages, &options);
                assert!(manifest.len() > 1);
                for c in &manifest.chunks {
                    assert!(
                        c.content.chars().count() >= options.min_chunk_tokens * CHARS_PER_TOKEN,
                        "chunk {} too small (size {}, semantic {})",
                        c.index,
                        size,
                        semantic
                    );
                }
            }
        }
    }

    #[test]
    fn test_semantic_never_cuts_code() {
        let manifest = chunk(&sample_pages(), 40, true);
        for c in &manifest.chunks {
            let fences = c.content.lines().filter(|l| l.trim_start().starts_with("```")).count();
            assert_eq!(fences % 2, 0, "chunk {} splits a code block", c.index);
        }
    }

    #[test]
    fn test_plain_split_cuts_at_newlines() {
        let text: String = (0..10).map(|i| format!("line number {:02}\n", i)).collect();
        let manifest = chunk(&[page("https://example.com/a", &text)], 10, false);

        assert_eq!(manifest.len(), 4);
        for c in &manifest.chunks[..3] {
            assert!(c.content.ends_with('\n'));
            assert!(c.content.chars().count() >= 40);
        }
        assert_eq!(manifest.chunks[3].boundary_type, BoundaryType::EndOfCorpus);
    }

    #[test]
    fn test_header_is_preferred_cut() {
        let p1 = "lorem ".repeat(10);
        let p2 = "lorem ".repeat(4);
        let p3 = "lorem ".repeat(20);
        let text = format!("{}\n\n## Setup\n\n{}\n\n{}", p1.trim_end(), p2.trim_end(), p3.trim_end());
        let manifest = chunk(&[page("https://example.com/a", &text)], 25, true);

        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.chunks[0].boundary_type, BoundaryType::Header);
        assert!(manifest.chunks[1].content.starts_with("## Setup"));
        assert_eq!(joined(&manifest), text);
    }

    #[test]
    fn test_small_tail_is_merged() {
        let text = format!("{}\n\ntail text", "lorem ".repeat(16).trim_end());
        let manifest = chunk(&[page("https://example.com/a", &text)], 25, true);

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.chunks[0].content, text);
        assert_eq!(manifest.chunks[0].boundary_type, BoundaryType::EndOfCorpus);
    }

    #[test]
    fn test_source_pages_and_manifest() {
        let pages = vec![
            page("https://example.com/one", &format!("## One\n\n{}", "alpha ".repeat(15).trim_end())),
            page("https://example.com/two", &format!("## Two\n\n{}", "beta ".repeat(15).trim_end())),
        ];
        let manifest = chunk(&pages, 30, true);

        assert!(manifest.len() >= 2);
        assert_eq!(manifest.chunks[0].source_page_refs[0], "https://example.com/one");
        assert!(manifest.chunks.iter().all(|c| !c.source_page_refs.is_empty()));
        let last = manifest.chunks.last().unwrap();
        assert!(last.source_page_refs.contains(&"https://example.com/two".to_string()));

        assert_eq!(manifest.chunks[0].filename, "chunk_001.md");
        assert_eq!(manifest.total_chunks, manifest.len());
        assert_eq!(manifest.total_words, 34);

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["chunks"][0]["chunk_id"], 1);
        assert_eq!(json["chunks"][0]["source_pages"][0], "https://example.com/one");
        assert!(json["chunks"][0].get("content").is_none());

        // Deterministic
        assert_eq!(chunk(&pages, 30, true), manifest);
    }

    #[test]
    fn test_only_succeeded_pages_are_chunked() {
        let mut skipped = page("https://example.com/thin", "thin");
        skipped.status = PageStatus::Skipped;
        let manifest = chunk(&[skipped, page("https://example.com/empty", "  ")], 100, true);
        assert!(manifest.is_empty());
        assert_eq!(manifest.total_tokens, 0);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
