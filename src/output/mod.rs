//! Output module for crawl reports and summaries
//!
//! This module handles:
//! - Writing the JSON crawl report
//! - Printing the human-readable console listing
//! - Generating the optional markdown summary
//! - Computing summary statistics

mod console;
mod json;
mod markdown;
pub mod stats;
mod traits;

pub use console::{format_console_report, ConsoleSink};
pub use json::JsonReportSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownSummarySink};
pub use stats::CrawlSummary;
pub use traits::{OutputError, OutputResult, ResultSink};

use crate::config::OutputConfig;
use crate::crawler::CrawlReport;

/// Builds the file sinks configured in `output`
///
/// The JSON report is always written; the markdown summary only when a
/// summary path is set.
pub fn file_sinks(output: &OutputConfig) -> Vec<Box<dyn ResultSink>> {
    let mut sinks: Vec<Box<dyn ResultSink>> =
        vec![Box::new(JsonReportSink::new(&output.report_path))];
    if let Some(summary_path) = &output.summary_path {
        sinks.push(Box::new(MarkdownSummarySink::new(summary_path)));
    }
    sinks
}

/// Writes `report` to every sink, stopping at the first failure
pub fn emit_report(report: &CrawlReport, sinks: &[Box<dyn ResultSink>]) -> OutputResult<()> {
    for sink in sinks {
        tracing::debug!("Writing report to {} sink", sink.name());
        sink.write_report(report)?;
    }
    Ok(())
}
