// src/output/summary.rs
// =============================================================================
// The crawl summary shown when a run ends.
//
// Two forms:
// - a table for the terminal (one row per page, then the totals)
// - the same data as JSON (--json), for scripts and CI
//
// Whatever happened, the summary always reports how many pages succeeded,
// were skipped or failed, and why each non-succeeded page didn't make it.
// =============================================================================

use std::path::PathBuf;

use serde::Serialize;

use crate::crawl::{CrawlReport, PageResult, PageStatus, StopReason};

/// Widest URL shown in the table before it gets cut.
const URL_COLUMN: usize = 60;

#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub total_words: usize,
    pub elapsed_secs: f64,
    pub stop_reason: StopReason,
    pub pages: Vec<PageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

/// One row of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub status: PageStatus,
    pub depth: usize,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&PageResult> for PageSummary {
    fn from(page: &PageResult) -> Self {
        Self {
            url: page.url.clone(),
            status: page.status,
            depth: page.depth,
            word_count: page.word_count,
            reason: page.error.clone(),
        }
    }
}

impl CrawlSummary {
    pub fn from_report(report: &CrawlReport) -> Self {
        Self {
            seed: report.seed.clone(),
            succeeded: report.count(PageStatus::Succeeded),
            skipped: report.count(PageStatus::Skipped),
            failed: report.count(PageStatus::Failed),
            success_rate: report.success_rate(),
            total_words: report.succeeded().map(|p| p.word_count).sum(),
            elapsed_secs: report.elapsed.as_secs_f64(),
            stop_reason: report.stop_reason.clone(),
            pages: report.pages.iter().map(PageSummary::from).collect(),
            output_dir: None,
            chunks: None,
        }
    }

    pub fn with_output(mut self, dir: PathBuf, chunks: Option<usize>) -> Self {
        self.output_dir = Some(dir);
        self.chunks = chunks;
        self
    }
}

// Renders the summary as a terminal table
//
// URL                                                          STATUS        WORDS   REASON
// =====================================================================================...
// https://example.com/docs                                     ✅ OK         1250
// https://example.com/docs/old                                 ❌ FAILED     0       HTTP 404
pub fn render_table(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<60} {:<13} {:<7} {}\n", "URL", "STATUS", "WORDS", "REASON"));
    out.push_str(&"=".repeat(105));
    out.push('\n');

    for page in &summary.pages {
        let reason = page.reason.as_deref().unwrap_or("");
        out.push_str(&format!(
            "{:<60} {:<13} {:<7} {}\n",
            shorten(&page.url),
            format_status(page.status),
            page.word_count,
            reason
        ));
    }

    out.push('\n');
    out.push_str("📊 Summary:\n");
    out.push_str(&format!("   ✅ Succeeded: {}\n", summary.succeeded));
    out.push_str(&format!("   ⏭️  Skipped: {}\n", summary.skipped));
    out.push_str(&format!("   ❌ Failed: {}\n", summary.failed));
    out.push_str(&format!("   📋 Total: {}\n", summary.pages.len()));
    out.push_str(&format!("   📈 Success rate: {:.1}%\n", summary.success_rate));
    out.push_str(&format!("   📝 Words: {}\n", summary.total_words));
    out.push_str(&format!("   🛑 Stopped: {}\n", describe_stop(&summary.stop_reason)));
    out.push_str(&format!("   ⏱️  Time: {:.1}s\n", summary.elapsed_secs));

    if let Some(dir) = &summary.output_dir {
        out.push_str(&format!("   📁 Output: {}\n", dir.display()));
    }
    if let Some(chunks) = summary.chunks {
        out.push_str(&format!("   🧩 Chunks: {}\n", chunks));
    }

    out
}

fn format_status(status: PageStatus) -> &'static str {
    match status {
        PageStatus::Succeeded => "✅ OK",
        PageStatus::Skipped => "⏭️  SKIPPED",
        PageStatus::Failed => "❌ FAILED",
    }
}

pub(crate) fn describe_stop(reason: &StopReason) -> String {
    match reason {
        StopReason::FrontierExhausted => "no more pages to visit".to_string(),
        StopReason::PageBudgetReached => "page limit reached".to_string(),
        StopReason::Cancelled => "cancelled".to_string(),
        StopReason::TimeBudgetExceeded => "time limit reached".to_string(),
        StopReason::FetcherUnavailable(why) => format!("fetcher unavailable ({})", why),
    }
}

// Cuts long URLs to fit the column (counting chars, not bytes)
fn shorten(url: &str) -> String {
    if url.chars().count() > URL_COLUMN - 3 {
        let cut: String = url.chars().take(URL_COLUMN - 3).collect();
        format!("{}...", cut)
    } else {
        url.to_string()
    }
}
