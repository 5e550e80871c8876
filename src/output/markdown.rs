//! Markdown export of a crawl report
//!
//! Renders the ranked projects and articles, the keyword and topic trend
//! tables, and a per-source outcome breakdown as a human-readable document.

use crate::model::TrendEntry;
use crate::orchestrator::CrawlReport;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a crawl report to `output_path` as markdown.
///
/// # Arguments
///
/// * `report` - The finished crawl report to render
/// * `output_path` - Destination file; overwritten if it exists
///
/// # Returns
///
/// * `Ok(())` - Report written successfully
/// * `Err(TrendError)` - Failed to create or write the file
pub fn write_markdown_report(report: &CrawlReport, output_path: &Path) -> Result<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown.
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Trendscout Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Domain**: {}\n", report.domain));
    if report.keywords.is_empty() {
        md.push_str("- **Keywords**: (curated terms only)\n\n");
    } else {
        md.push_str(&format!("- **Keywords**: {}\n\n", report.keywords.join(", ")));
    }

    md.push_str("## Sources\n\n");
    md.push_str("| Source | Status | Items | Cached | Elapsed |\n");
    md.push_str("|--------|--------|-------|--------|--------|\n");
    for outcome in &report.sources {
        let status = if outcome.success {
            "ok".to_string()
        } else {
            outcome.error.clone().unwrap_or_else(|| "failed".to_string())
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {}ms |\n",
            outcome.source,
            status,
            outcome.count,
            if outcome.from_cache { "yes" } else { "no" },
            outcome.elapsed_ms
        ));
    }
    md.push('\n');

    push_entries(&mut md, "Top Projects", &report.summary.projects);
    push_entries(&mut md, "Top Articles", &report.summary.articles);

    if !report.summary.keyword_trends.is_empty() {
        md.push_str("## Keyword Trends\n\n");
        md.push_str("| Keyword | Mentions |\n");
        md.push_str("|---------|----------|\n");
        for (keyword, count) in &report.summary.keyword_trends {
            md.push_str(&format!("| {} | {} |\n", keyword, count));
        }
        md.push('\n');
    }

    if !report.summary.topic_trends.is_empty() {
        md.push_str("## Topic Trends\n\n");
        md.push_str("| Topic | Items |\n");
        md.push_str("|-------|-------|\n");
        for (topic, count) in &report.summary.topic_trends {
            md.push_str(&format!("| {} | {} |\n", topic, count));
        }
        md.push('\n');
    }

    md
}

fn push_entries(md: &mut String, heading: &str, entries: &[TrendEntry]) {
    if entries.is_empty() {
        return;
    }
    md.push_str(&format!("## {}\n\n", heading));
    for (rank, entry) in entries.iter().enumerate() {
        md.push_str(&format!(
            "{}. [{}]({}) - score {:.1} ({})\n",
            rank + 1,
            entry.title,
            entry.url,
            entry.score,
            entry.source
        ));
        if !entry.snippet.is_empty() {
            md.push_str(&format!("   > {}\n", entry.snippet));
        }
        if !entry.tags.is_empty() {
            md.push_str(&format!("   tags: {}\n", entry.tags.join(", ")));
        }
    }
    md.push('\n');
}
