// src/output/mod.rs
// =============================================================================
// This module turns a finished crawl into files on disk.
//
// Layout of one run:
//   <output_dir>/<site>/                      (or <site>_<timestamp>/ if taken)
//     <site>_docs_<timestamp>.md              all pages in reading order
//     <site>_index_<timestamp>.md             pages grouped by section
//     <site>_metadata_<timestamp>.json        stats, pages, failures, config
//     sections/<section>.md                   one file per top-level section
//     chunks/chunk_001.md ... manifest.json   only when chunking is enabled
//
// The text of each document is built in `render`; this file only decides
// names and writes. `summary` renders the console/JSON crawl summary.
// =============================================================================

mod render;
mod summary;

pub use render::{
    build_metadata, group_sections, reading_order, render_combined, render_index, render_section, safe_file_name,
    title_case, Metadata, SiteInfo,
};
pub use summary::{render_table, CrawlSummary, PageSummary};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::chunk::ChunkManifest;
use crate::config::Config;
use crate::crawl::{CrawlReport, PageResult};
use crate::error::OutputError;

static NON_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]").expect("valid site name regex"));

/// First host labels that say "documentation" rather than naming the site.
const GENERIC_LABELS: &[&str] = &["docs", "documentation", "help", "api"];

/// Paths of everything one run wrote.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFiles {
    pub directory: PathBuf,
    pub combined: PathBuf,
    pub index: PathBuf,
    pub metadata: PathBuf,
    pub sections: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<PathBuf>,
}

// Derives a short site name from the seed's host
//
// Examples:
//   https://www.example.com/docs     -> "example"
//   https://docs.python.org/3/       -> "python"
//   https://help.github.com          -> "github"
//   http://localhost:8000            -> "localhost"
pub fn derive_site_name(seed: &Url) -> String {
    let host = seed.host_str().unwrap_or("site").to_lowercase();
    let host = host.replace("www.", "").replace("docs.", "");

    let labels: Vec<&str> = host.split('.').collect();
    let name = match labels.as_slice() {
        [first, second, ..] if GENERIC_LABELS.contains(first) => *second,
        [first, ..] => *first,
        [] => "site",
    };

    let name = NON_NAME_CHARS.replace_all(name, "").to_string();
    if name.is_empty() {
        "site".to_string()
    } else {
        name
    }
}

/// "20240131_142501"
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

// Creates the directory for this run
//
// Parameters:
// - output_dir: the configured root ("crawled_docs")
// - site_name: the derived or configured name
// - stamp: the run's timestamp, used when the plain name is taken
// - overwrite: replace an existing directory instead of creating a sibling
//
// Returns: the directory that was created
pub fn prepare_site_dir(output_dir: &Path, site_name: &str, stamp: &str, overwrite: bool) -> Result<PathBuf, OutputError> {
    let mut dir = output_dir.join(site_name);

    if dir.exists() {
        if overwrite {
            debug!(dir = %dir.display(), "Replacing existing output directory");
            fs::remove_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        } else {
            dir = output_dir.join(format!("{}_{}", site_name, stamp));
        }
    }

    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
    Ok(dir)
}

// Writes every artifact of a crawl
//
// Parameters:
// - report: the finished crawl
// - site: name, source and crawl time used in headers and file names
// - config: recorded in the metadata as "config_used"
// - chunks: the chunk set, when chunking is enabled
// - overwrite: see `prepare_site_dir`
pub fn write_outputs(
    report: &CrawlReport,
    site: &SiteInfo,
    config: &Config,
    chunks: Option<&ChunkManifest>,
    overwrite: bool,
) -> Result<WrittenFiles, OutputError> {
    let stamp = timestamp(&site.crawled_at);
    let dir = prepare_site_dir(&config.output.output_dir, &site.name, &stamp, overwrite)?;
    let pages: Vec<&PageResult> = report.succeeded().collect();

    let combined = dir.join(format!("{}_docs_{}.md", site.name, stamp));
    write_file(&combined, &render_combined(site, &pages))?;

    let index = dir.join(format!("{}_index_{}.md", site.name, stamp));
    write_file(&index, &render_index(site, &pages))?;

    let metadata = dir.join(format!("{}_metadata_{}.json", site.name, stamp));
    write_json(&metadata, "crawl metadata", &build_metadata(site, report, config))?;

    let sections = write_sections(&dir.join("sections"), site, &pages)?;

    let chunks = match chunks {
        Some(manifest) => Some(write_chunks(&dir.join("chunks"), manifest)?),
        None => None,
    };

    info!(dir = %dir.display(), pages = pages.len(), "Wrote output files");

    Ok(WrittenFiles {
        directory: dir,
        combined,
        index,
        metadata,
        sections,
        chunks,
    })
}

fn write_sections(dir: &Path, site: &SiteInfo, pages: &[&PageResult]) -> Result<Vec<PathBuf>, OutputError> {
    let mut written = Vec::new();
    if pages.is_empty() {
        return Ok(written);
    }

    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    for (section, section_pages) in group_sections(pages) {
        let path = dir.join(format!("{}.md", safe_file_name(&section)));
        write_file(&path, &render_section(site, &section, &section_pages))?;
        written.push(path);
    }
    Ok(written)
}

/// Writes `chunk_NNN.md` for every chunk plus `manifest.json`; returns the chunk directory.
pub fn write_chunks(dir: &Path, manifest: &ChunkManifest) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    for chunk in &manifest.chunks {
        write_file(&dir.join(&chunk.filename), &chunk.content)?;
    }
    write_json(&dir.join("manifest.json"), "chunk manifest", manifest)?;

    debug!(dir = %dir.display(), chunks = manifest.len(), "Wrote chunk files");
    Ok(dir.to_path_buf())
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|e| io_error(path, e))
}

fn write_json<T: Serialize>(path: &Path, what: &'static str, value: &T) -> Result<(), OutputError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| OutputError::Json { what, source })?;
    write_file(path, &text)
}

fn io_error(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}
