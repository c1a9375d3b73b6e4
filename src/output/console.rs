//! Human-readable console listing

use crate::crawler::CrawlReport;
use crate::output::stats::CrawlSummary;
use crate::output::traits::{OutputResult, ResultSink};
use std::io::Write;

/// Prints every crawled page with its links, then failures and statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write_report(&self, report: &CrawlReport) -> OutputResult<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(format_console_report(report).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Formats the console listing for `report`
pub fn format_console_report(report: &CrawlReport) -> String {
    let mut text = String::new();

    text.push_str(&format!("=== Crawl of {} ===\n\n", report.start_url));

    for page in &report.pages {
        text.push_str(&format!("{}\n", page.url));
        if page.links.is_empty() {
            text.push_str("  (no links)\n");
        }
        for link in &page.links {
            text.push_str(&format!("  -> {}\n", link));
        }
    }

    if !report.failures.is_empty() {
        text.push_str(&format!("\nFailures ({}):\n", report.failures.len()));
        for failure in &report.failures {
            text.push_str(&format!("  {}: {}\n", failure.url, failure.error));
        }
    }

    let summary = CrawlSummary::from_report(report);
    text.push_str("\nOverview:\n");
    text.push_str(&format!("  Pages crawled: {}\n", summary.pages_crawled));
    text.push_str(&format!("  Failures: {}\n", summary.failures));
    text.push_str(&format!(
        "  Links found: {} ({} unique)\n",
        summary.total_links, summary.unique_links
    ));
    text.push_str(&format!(
        "  Success Rate: {:.1}% ({} / {} fetches)\n",
        summary.success_rate(),
        summary.pages_crawled,
        summary.total_attempted()
    ));

    text
}
