// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every crawl option can come from three places, strongest first:
//   1. a flag on the command line (--max-pages 100)
//   2. the config file (--config crawler_config.toml)
//   3. the built-in default
//
// Flags are all optional here so we can tell "not given" apart from
// "given with the default value" and only override what the user typed.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

use doc_harvester::config::Config;

/// Where --create-config writes when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "crawler_config.toml";

#[derive(Parser, Debug)]
#[command(
    name = "doc-harvester",
    version,
    about = "Crawl a documentation website into clean markdown for LLM context windows",
    long_about = "doc-harvester crawls a documentation site breadth-first, strips navigation and \
                  other page chrome, and writes one combined markdown document plus an index, \
                  per-section files and crawl metadata. With --chunk the content is also split \
                  into token-sized chunks that never cut through a code block."
)]
pub struct Cli {
    /// Documentation URL to start from (e.g., https://docs.example.com/guide/)
    ///
    /// Only pages on the same site (and, by default, under the same docs
    /// path) are crawled
    #[arg(required_unless_present = "create_config")]
    pub url: Option<String>,

    /// Config file to load (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of pages to fetch (default: 50)
    #[arg(short, long)]
    pub max_pages: Option<usize>,

    /// Directory to write results into (default: crawled_docs)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Name used for the output directory and files (default: derived from the host)
    #[arg(short = 'n', long)]
    pub site_name: Option<String>,

    /// Also split the content into chunks for LLM context windows
    #[arg(long)]
    pub chunk: bool,

    /// Target chunk size in tokens (default: 2000)
    #[arg(long, value_name = "TOKENS")]
    pub chunk_size: Option<usize>,

    /// Cut chunks at fixed sizes instead of at headers and paragraphs
    #[arg(long)]
    pub no_semantic_splitting: bool,

    /// Seconds to wait between requests (default: 0.5)
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// How many links away from the start page to go (default: unlimited)
    ///
    /// Depth 0 = just the starting page
    /// Depth 1 = starting page + all pages it links to
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Write a sample config file and exit (default path: crawler_config.toml)
    ///
    /// Use a .json extension to get a JSON config instead of TOML
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CONFIG_PATH
    )]
    pub create_config: Option<PathBuf>,

    /// Print the crawl summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Show per-page decisions in the log
    #[arg(short, long)]
    pub verbose: bool,

    /// Replace an existing output directory instead of creating a timestamped one
    #[arg(long)]
    pub overwrite: bool,
}

impl Cli {
    // Copies every flag the user actually gave into the config
    //
    // Parameters:
    //   config: loaded from file (or defaults); changed in place
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_pages) = self.max_pages {
            config.crawl_settings.max_pages = max_pages;
        }
        if let Some(delay) = self.delay {
            config.crawl_settings.crawl_delay = delay;
        }
        if let Some(depth) = self.max_depth {
            config.crawl_settings.max_depth = Some(depth);
        }
        if self.verbose {
            config.crawl_settings.verbose = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(name) = &self.site_name {
            config.output.site_name = Some(name.clone());
        }
        if self.chunk {
            config.chunking.enable_chunking = true;
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if self.no_semantic_splitting {
            config.chunking.semantic_splitting = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("doc-harvester").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_url_is_required() {
        assert!(Cli::try_parse_from(["doc-harvester"]).is_err());
        assert!(Cli::try_parse_from(["doc-harvester", "--create-config"]).is_ok());
    }

    #[test]
    fn test_create_config_default_path() {
        let cli = parse(&["--create-config"]);
        assert_eq!(cli.create_config, Some(PathBuf::from(DEFAULT_CONFIG_PATH)));

        let cli = parse(&["--create-config", "my.json"]);
        assert_eq!(cli.create_config, Some(PathBuf::from("my.json")));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "https://docs.example.com",
            "-m",
            "10",
            "--delay",
            "1.5",
            "--max-depth",
            "2",
            "--chunk",
            "--chunk-size",
            "500",
            "--no-semantic-splitting",
            "-n",
            "example",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.crawl_settings.max_pages, 10);
        assert_eq!(config.crawl_settings.crawl_delay, 1.5);
        assert_eq!(config.crawl_settings.max_depth, Some(2));
        assert!(config.chunking.enable_chunking);
        assert_eq!(config.chunking.chunk_size, 500);
        assert!(!config.chunking.semantic_splitting);
        assert_eq!(config.site_name(), Some("example"));
    }

    #[test]
    fn test_huge_delay_flag_fails_validation() {
        let cli = parse(&["https://docs.example.com", "--delay", "1e30"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let cli = parse(&["https://docs.example.com"]);
        let mut config = Config::default();
        config.crawl_settings.max_pages = 7;
        config.chunking.enable_chunking = true;
        cli.apply_overrides(&mut config);

        assert_eq!(config.crawl_settings.max_pages, 7);
        assert!(config.chunking.enable_chunking);
        assert!(config.chunking.semantic_splitting);
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Option<usize> instead of default_value_t?
//    - With a default value clap can't tell us whether the user typed the
//      flag, and then a config file value would always be overwritten
//    - None = "not given", so the config file (or built-in default) wins
//
// 2. num_args = 0..=1 with default_missing_value
//    - Lets --create-config be used alone or with a path:
//      doc-harvester --create-config
//      doc-harvester --create-config docs.json
//
// 3. required_unless_present
//    - The URL is only optional when we're just writing a sample config
// -----------------------------------------------------------------------------
