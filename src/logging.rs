// src/logging.rs
// Log setup for the binary. RUST_LOG wins over the default filter, and
// everything goes to stderr so `--json` output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for a normal run.
pub const DEFAULT_FILTER: &str = "doc_harvester=info";
/// Default filter with `--verbose`.
pub const VERBOSE_FILTER: &str = "doc_harvester=debug";

pub fn setup_logging(default_log_settings: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_settings.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init()
}

/// Picks the default filter for the verbosity flag.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}
