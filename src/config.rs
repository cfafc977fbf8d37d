// src/config.rs
// =============================================================================
// The configuration file.
//
// A config file is optional. Every option has a default, so an empty file
// (or no file) is a valid configuration:
//
//   [crawl_settings]
//   max_pages = 50
//   crawl_delay = 0.5        # seconds ("delay" works too)
//
//   [content_extraction]
//   content_selector = "main, article"
//
//   [url_patterns]
//   include = []             # empty = detect from the seed URL
//   exclude = []             # empty = built-in exclusions
//
//   [chunking]
//   enable_chunking = true
//
//   [output]
//   output_dir = "crawled_docs"
//
// TOML and JSON are both accepted (chosen by file extension). Unknown keys
// and out-of-range values are rejected before anything is fetched.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::chunk::ChunkOptions;
use crate::crawl::{CrawlPatterns, CrawlSettings, DEFAULT_EXCLUDES};
use crate::error::ConfigError;

/// Tags removed from every page before conversion to markdown.
pub const DEFAULT_EXCLUDED_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "noscript", "iframe", "form", "button",
];

/// Longest accepted pause between two fetches, in seconds.
pub const MAX_CRAWL_DELAY_SECS: f64 = 3600.0;

const DEFAULT_USER_AGENT: &str = concat!("doc-harvester/", env!("CARGO_PKG_VERSION"));

/// The whole config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub crawl_settings: CrawlSection,
    pub content_extraction: ContentSection,
    pub url_patterns: PatternSection,
    pub chunking: ChunkingSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlSection {
    pub max_pages: usize,
    /// Seconds to wait between two fetches
    #[serde(alias = "delay")]
    pub crawl_delay: f64,
    pub min_word_count: usize,
    /// Minimum characters of cleaned content
    pub min_content_length: usize,
    /// Milliseconds
    pub page_timeout: u64,
    pub headless: bool,
    /// Debug logging
    pub verbose: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_links_per_page: Option<usize>,
    /// Wall-clock budget for the whole crawl, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            max_pages: 50,
            crawl_delay: 0.5,
            min_word_count: 20,
            min_content_length: 100,
            page_timeout: 30_000,
            headless: true,
            verbose: false,
            max_depth: None,
            max_links_per_page: None,
            max_duration_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentSection {
    /// CSS selector list for the main content area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_selector: Option<String>,
    pub excluded_tags: Vec<String>,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            content_selector: None,
            excluded_tags: DEFAULT_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternSection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingSection {
    pub enable_chunking: bool,
    /// Target chunk size in (estimated) tokens
    pub chunk_size: usize,
    pub semantic_splitting: bool,
    /// Defaults to a quarter of chunk_size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_chunk_size: Option<usize>,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            enable_chunking: false,
            chunk_size: 2000,
            semantic_splitting: true,
            min_chunk_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Parent directory; each site gets its own subdirectory
    pub output_dir: PathBuf,
    /// Name used in file names and titles ("auto" or absent = from the host)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("crawled_docs"),
            site_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "toml" => Ok(Format::Toml),
            Some(ext) if ext == "json" => Ok(Format::Json),
            other => Err(ConfigError::Parse {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported config format '{}' (use .toml or .json)",
                    other.unwrap_or_default()
                ),
            }),
        }
    }
}

impl Config {
    // Loads and validates a config file
    //
    // Parameters:
    //   path: a .toml or .json file
    //
    // Returns:
    //   Ok(Config) with defaults filled in for every absent option
    //   Err(ConfigError) if the file can't be read, parsed, or has bad values
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = Format::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&text, format).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str, format: Format) -> Result<Self, String> {
        match format {
            Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }

    /// Rejects values that would make the crawl meaningless or impossible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let crawl = &self.crawl_settings;

        if crawl.max_pages == 0 {
            return Err(out_of_range("max_pages", "must be at least 1"));
        }
        if !crawl.crawl_delay.is_finite() || crawl.crawl_delay < 0.0 {
            return Err(out_of_range("crawl_delay", "must be a non-negative number of seconds"));
        }
        if crawl.crawl_delay > MAX_CRAWL_DELAY_SECS {
            return Err(out_of_range(
                "crawl_delay",
                format!("{} is more than {} seconds", crawl.crawl_delay, MAX_CRAWL_DELAY_SECS),
            ));
        }
        if crawl.page_timeout == 0 {
            return Err(out_of_range("page_timeout", "must be at least 1 ms"));
        }
        if crawl.max_duration_secs == Some(0) {
            return Err(out_of_range("max_duration_secs", "must be at least 1 second"));
        }
        if crawl.max_links_per_page == Some(0) {
            return Err(out_of_range("max_links_per_page", "must be at least 1"));
        }
        if crawl.user_agent.trim().is_empty() {
            return Err(out_of_range("user_agent", "must not be empty"));
        }

        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(out_of_range("chunk_size", "must be at least 1 token"));
        }
        if let Some(min) = chunking.min_chunk_size {
            if min > chunking.chunk_size {
                return Err(out_of_range(
                    "min_chunk_size",
                    format!("{} is larger than chunk_size ({})", min, chunking.chunk_size),
                ));
            }
        }

        if let Some(selector) = &self.content_extraction.content_selector {
            Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector(selector.clone()))?;
        }

        // Compiling is the only way to know a pattern is valid
        CrawlPatterns::compile(&self.url_patterns.include, &self.url_patterns.exclude)?;

        Ok(())
    }

    /// Crawl knobs for the orchestrator.
    pub fn crawl_settings(&self) -> CrawlSettings {
        let crawl = &self.crawl_settings;
        CrawlSettings {
            max_pages: crawl.max_pages,
            // validate() bounds the delay; anything else falls back to no delay
            crawl_delay: Duration::try_from_secs_f64(crawl.crawl_delay).unwrap_or_default(),
            page_timeout: Duration::from_millis(crawl.page_timeout),
            min_word_count: crawl.min_word_count,
            min_content_length: crawl.min_content_length,
            headless: crawl.headless,
            content_selector: self.content_extraction.content_selector.clone(),
            excluded_tags: self.content_extraction.excluded_tags.clone(),
            max_depth: crawl.max_depth,
            max_links_per_page: crawl.max_links_per_page,
            max_duration: crawl.max_duration_secs.map(Duration::from_secs),
        }
    }

    /// Include/exclude patterns for a crawl from `seed`, detected where absent.
    pub fn patterns_for(&self, seed: &Url) -> Result<CrawlPatterns, ConfigError> {
        CrawlPatterns::resolve(seed, &self.url_patterns.include, &self.url_patterns.exclude)
    }

    pub fn chunk_options(&self) -> ChunkOptions {
        let options = ChunkOptions::new(self.chunking.chunk_size, self.chunking.semantic_splitting);
        match self.chunking.min_chunk_size {
            Some(min) => options.with_min_chunk_tokens(min),
            None => options,
        }
    }

    /// The site name from the config, ignoring the "auto" placeholder.
    pub fn site_name(&self) -> Option<&str> {
        self.output
            .site_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("auto"))
    }

    /// A config with every section filled in, as written by --create-config.
    pub fn sample() -> Self {
        let mut config = Config::default();
        config.content_extraction.content_selector =
            Some("main, .content, .docs-content, article, .markdown-body, .documentation".to_string());
        config.url_patterns.exclude = DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
        config.output.site_name = Some("auto".to_string());
        config
    }

    // Writes the sample config to `path` (TOML unless the extension is .json)
    pub fn write_sample(path: &Path) -> Result<(), ConfigError> {
        let sample = Self::sample();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json"));

        let rendered = if is_json {
            serde_json::to_string_pretty(&sample).map_err(std::io::Error::from)
        } else {
            toml::to_string_pretty(&sample).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        };

        rendered
            .and_then(|text| std::fs::write(path, text))
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn out_of_range(option: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::OutOfRange {
        option,
        reason: reason.into(),
    }
}
