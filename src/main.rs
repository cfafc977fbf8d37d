// src/main.rs
// =============================================================================
// This is the entry point of the doc-harvester CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the config file (if any) and apply the flags on top of it
// 3. Crawl the site, cancelling cleanly on Ctrl-C
// 4. Chunk the content (if enabled) and write every output file
// 5. Print the crawl summary and exit with a proper code
//    (0 = pages collected, 1 = nothing collected, 2 = error)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use cli::Cli;
use doc_harvester::chunk::chunk_with;
use doc_harvester::config::Config;
use doc_harvester::crawl::{CancelToken, Crawler, HttpFetcher};
use doc_harvester::error::ConfigError;
use doc_harvester::logging::{default_filter, setup_logging};
use doc_harvester::output::{self, render_table, CrawlSummary, SiteInfo};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// The main application logic
// Returns:
//   Ok(0) = at least one page was collected
//   Ok(1) = the crawl ran but nothing usable came back
//   Err   = bad configuration or an unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(path) = &cli.create_config {
        Config::write_sample(path)?;
        println!("📝 Sample config written to {}", path.display());
        return Ok(0);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    setup_logging(default_filter(config.crawl_settings.verbose));

    // clap guarantees a URL whenever --create-config is absent
    let seed_raw = cli.url.as_deref().unwrap_or_default();
    let seed = Url::parse(seed_raw.trim()).map_err(|e| ConfigError::InvalidSeed {
        url: seed_raw.to_string(),
        reason: e.to_string(),
    })?;

    let patterns = config.patterns_for(&seed)?;
    let settings = config.crawl_settings();
    let fetcher = HttpFetcher::new(&config.crawl_settings.user_agent, settings.page_timeout)?;

    if !cli.json {
        println!("🔍 Crawling documentation: {}", seed);
        println!("📊 Max pages: {}", settings.max_pages);
    }
    let (include, exclude) = patterns.describe();
    info!(include = ?include, exclude_count = exclude.len(), "URL patterns");

    let cancel = CancelToken::new();
    watch_ctrl_c(cancel.clone());

    let crawler = Crawler::new(fetcher, settings, patterns).with_cancel_token(cancel);
    let report = crawler.crawl(seed.as_str()).await?;

    let manifest = if config.chunking.enable_chunking {
        let manifest = chunk_with(&report.pages, &config.chunk_options());
        info!(chunks = manifest.len(), tokens = manifest.total_tokens, "Chunked content");
        Some(manifest)
    } else {
        None
    };

    let site_name = match config.site_name() {
        Some(name) => output::safe_file_name(name),
        None => output::derive_site_name(&seed),
    };
    let site = SiteInfo::new(&site_name, &report);
    let written = output::write_outputs(&report, &site, &config, manifest.as_ref(), cli.overwrite)?;

    let summary = CrawlSummary::from_report(&report).with_output(written.directory, manifest.map(|m| m.len()));
    print_summary(&summary, cli.json)?;

    if summary.succeeded > 0 {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Cancels the crawl on the first Ctrl-C; pages collected so far are kept
fn watch_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the pages collected so far");
            cancel.cancel();
        }
    });
}

// Prints the summary either as a table or JSON
fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!();
        print!("{}", render_table(summary));
    }
    Ok(())
}
