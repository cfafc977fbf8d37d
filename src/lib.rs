// src/lib.rs
// =============================================================================
// doc-harvester: crawl a documentation site, clean every page into markdown
// that is ready for an LLM context window, and optionally cut the result
// into size-bounded chunks.
//
// Pipeline:
//   crawl  -> breadth-first discovery + fetching, one PageResult per page
//   clean  -> noise removal, link rewriting, structure and spacing fixes
//   chunk  -> token-bounded chunks that never cut through code blocks
//   output -> combined doc, index, sections, metadata, chunk files
// =============================================================================

pub mod chunk;
pub mod clean;
pub mod config;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod output;
