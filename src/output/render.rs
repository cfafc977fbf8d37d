// src/output/render.rs
// =============================================================================
// Builds the text of every output document. Nothing here touches the disk,
// so each document can be tested as a plain string.
//
// Documents:
// - combined: every page in one file, with a table of contents
// - section:  the pages of one top-level path segment ("docs", "api", ...)
// - index:    per-section page list with word counts and summaries
// - metadata: the machine-readable crawl record (JSON)
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::Config;
use crate::crawl::{CrawlReport, PageResult, PageStatus, StopReason};

/// Separates pages in the combined document.
const PAGE_RULE_WIDTH: usize = 100;

/// Who and what the documents are about.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub name: String,
    pub base_url: String,
    pub domain: String,
    pub crawled_at: DateTime<Local>,
    pub generator: String,
}

impl SiteInfo {
    pub fn new(name: &str, report: &CrawlReport) -> Self {
        Self {
            name: name.to_string(),
            base_url: report.seed.clone(),
            domain: report.base_domain.clone(),
            crawled_at: Local::now(),
            generator: concat!("doc-harvester ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    fn display_name(&self) -> String {
        title_case(&self.name)
    }
}

// Orders pages for reading: shallow paths first, then alphabetically,
// then the richest page first when paths tie
pub fn reading_order<'a>(pages: &[&'a PageResult]) -> Vec<&'a PageResult> {
    let mut sorted = pages.to_vec();
    sorted.sort_by(|a, b| {
        let (pa, pb) = (a.path(), b.path());
        pa.matches('/')
            .count()
            .cmp(&pb.matches('/').count())
            .then_with(|| pa.cmp(&pb))
            .then_with(|| b.word_count.cmp(&a.word_count))
    });
    sorted
}

/// Pages grouped by section, sections in alphabetical order.
pub fn group_sections<'a>(pages: &[&'a PageResult]) -> BTreeMap<String, Vec<&'a PageResult>> {
    let mut sections: BTreeMap<String, Vec<&PageResult>> = BTreeMap::new();
    for &page in pages {
        sections.entry(page.section()).or_default().push(page);
    }
    sections
}

pub fn render_combined(site: &SiteInfo, pages: &[&PageResult]) -> String {
    let ordered = reading_order(pages);
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();

    let mut out = String::new();
    out.push_str(&format!("# {} Documentation\n\n", site.display_name()));
    out.push_str(&format!("**Source:** {}\n", site.base_url));
    out.push_str(&format!("**Generated:** {}\n", site.crawled_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("**Total Pages:** {}\n", pages.len()));
    out.push_str(&format!("**Total Words:** {}\n\n", thousands(total_words)));

    out.push_str("## Table of Contents\n\n");
    for (i, page) in ordered.iter().enumerate() {
        out.push_str(&format!("{}. [{}](#{})\n", i + 1, page.title, anchor(&page.title)));
    }
    out.push_str("\n---\n\n");

    for (i, page) in ordered.iter().enumerate() {
        out.push_str(&format!("# {}. {}\n\n", i + 1, page.title));
        out.push_str(&format!("**Path:** `{}`\n", page.path()));
        if !page.description.is_empty() {
            out.push_str(&format!("**Description:** {}\n", page.description));
        }
        out.push_str(&format!("**Word Count:** {}\n\n", page.word_count));
        out.push_str(&page.cleaned_content);
        out.push_str("\n\n");
        out.push_str(&"=".repeat(PAGE_RULE_WIDTH));
        out.push_str("\n\n");
    }

    out
}

pub fn render_section(site: &SiteInfo, section: &str, pages: &[&PageResult]) -> String {
    let mut sorted = pages.to_vec();
    sorted.sort_by_key(|p| p.path());
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();

    let mut out = String::new();
    out.push_str(&format!("# {} - {}\n\n", site.display_name(), title_case(section)));
    out.push_str(&format!("**Section:** {}\n", section));
    out.push_str(&format!("**Pages:** {}\n", pages.len()));
    out.push_str(&format!("**Total Words:** {}\n\n", thousands(total_words)));

    for page in sorted {
        out.push_str(&format!("## {}\n\n", page.title));
        if !page.description.is_empty() {
            out.push_str(&format!("*{}*\n\n", page.description));
        }
        out.push_str(&page.cleaned_content);
        out.push_str("\n\n---\n\n");
    }

    out
}

pub fn render_index(site: &SiteInfo, pages: &[&PageResult]) -> String {
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();
    let average = if pages.is_empty() { 0 } else { total_words / pages.len() };

    let mut out = String::new();
    out.push_str(&format!("# {} Documentation Index\n\n", site.display_name()));
    out.push_str("A structured overview of every crawled page, grouped by section.\n\n");

    out.push_str("## Overview\n\n");
    out.push_str(&format!("- **Total Pages:** {}\n", pages.len()));
    out.push_str(&format!("- **Total Words:** {}\n", thousands(total_words)));
    out.push_str(&format!("- **Average Words per Page:** {}\n", thousands(average)));
    out.push_str(&format!("- **Source:** {}\n\n", site.base_url));

    out.push_str("## Sections\n\n");
    for (section, section_pages) in group_sections(pages) {
        let words: usize = section_pages.iter().map(|p| p.word_count).sum();
        out.push_str(&format!("### {}\n\n", title_case(&section)));
        out.push_str(&format!(
            "**Pages:** {} | **Words:** {}\n\n",
            section_pages.len(),
            thousands(words)
        ));

        let mut sorted = section_pages;
        sorted.sort_by(|a, b| b.word_count.cmp(&a.word_count).then_with(|| a.title.cmp(&b.title)));

        for page in sorted {
            out.push_str(&format!("#### {}\n", page.title));
            out.push_str(&format!("- **Path:** `{}`\n", page.path()));
            out.push_str(&format!("- **Words:** {}\n", thousands(page.word_count)));
            if !page.description.is_empty() {
                out.push_str(&format!("- **Summary:** {}\n", page.description));
            }
            out.push_str(&format!("- **URL:** {}\n\n", page.url));
        }
    }

    out
}

// -----------------------------------------------------------------------------
// Metadata record
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Metadata<'a> {
    pub site_info: &'a SiteInfo,
    pub crawl_stats: CrawlStats,
    pub content_analysis: ContentAnalysis,
    pub pages: Vec<&'a PageResult>,
    pub failures: Vec<FailureRecord>,
    pub config_used: &'a Config,
}

#[derive(Debug, Serialize)]
pub struct CrawlStats {
    pub total_pages: usize,
    pub skipped_pages: usize,
    pub failed_pages: usize,
    pub total_words: usize,
    pub total_characters: usize,
    pub success_rate: f64,
    pub pages_visited: usize,
    pub elapsed_secs: f64,
    pub stop_reason: StopReason,
}

#[derive(Debug, Serialize)]
pub struct ContentAnalysis {
    pub avg_words_per_page: f64,
    pub longest_page: String,
    pub sections: Vec<String>,
    pub total_sections: usize,
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub url: String,
    pub status: PageStatus,
    pub reason: String,
}

pub fn build_metadata<'a>(site: &'a SiteInfo, report: &'a CrawlReport, config: &'a Config) -> Metadata<'a> {
    let pages: Vec<&PageResult> = report.succeeded().collect();
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();
    let sections: Vec<String> = group_sections(&pages).into_keys().collect();

    Metadata {
        site_info: site,
        crawl_stats: CrawlStats {
            total_pages: pages.len(),
            skipped_pages: report.count(PageStatus::Skipped),
            failed_pages: report.count(PageStatus::Failed),
            total_words,
            total_characters: pages.iter().map(|p| p.cleaned_content.chars().count()).sum(),
            success_rate: report.success_rate(),
            pages_visited: report.visited,
            elapsed_secs: report.elapsed.as_secs_f64(),
            stop_reason: report.stop_reason.clone(),
        },
        content_analysis: ContentAnalysis {
            avg_words_per_page: if pages.is_empty() {
                0.0
            } else {
                total_words as f64 / pages.len() as f64
            },
            longest_page: pages
                .iter()
                .max_by_key(|p| p.word_count)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            total_sections: sections.len(),
            sections,
        },
        failures: report
            .pages
            .iter()
            .filter(|p| !p.success())
            .map(|p| FailureRecord {
                url: p.url.clone(),
                status: p.status,
                reason: p.error.clone().unwrap_or_default(),
            })
            .collect(),
        pages,
        config_used: config,
    }
}

// -----------------------------------------------------------------------------
// Small text helpers
// -----------------------------------------------------------------------------

// "caddy-server docs" -> "Caddy-Server Docs"
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start_of_word = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if start_of_word {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(c);
            start_of_word = !c.is_alphanumeric();
        }
    }
    out
}

// "Getting Started!" -> "getting-started-"
fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect()
}

// 1234567 -> "1,234,567"
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// A section name that is safe as a file name.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}
