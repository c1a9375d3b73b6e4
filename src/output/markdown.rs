//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl,
//! including statistics, the crawled pages and the failures.

use crate::crawler::CrawlReport;
use crate::output::stats::CrawlSummary;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum number of pages listed individually
const MAX_LISTED_PAGES: usize = 50;

/// Writes a markdown summary file
#[derive(Debug, Clone)]
pub struct MarkdownSummarySink {
    path: PathBuf,
}

impl MarkdownSummarySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for MarkdownSummarySink {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn write_report(&self, report: &CrawlReport) -> OutputResult<()> {
        generate_markdown_summary(report, &self.path)?;
        tracing::info!("Summary written to {}", self.path.display());
        Ok(())
    }
}

/// Generates a markdown summary from a crawl report
///
/// # Arguments
///
/// * `report` - The finished crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let write_err = |source: std::io::Error| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    };
    let mut file = File::create(output_path).map_err(write_err)?;
    file.write_all(markdown.as_bytes()).map_err(write_err)?;

    Ok(())
}

/// Formats a crawl report as markdown
///
/// # Arguments
///
/// * `report` - The finished crawl report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let summary = CrawlSummary::from_report(report);
    let mut md = String::new();

    // Title
    md.push_str("# Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", summary.start_url));
    md.push_str(&format!("- **Generated**: {}\n", summary.generated_at));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", summary.pages_crawled));
    md.push_str(&format!("- **Failures**: {}\n", summary.failures));
    md.push_str(&format!("- **Total Links**: {}\n", summary.total_links));
    md.push_str(&format!("- **Unique Links**: {}\n", summary.unique_links));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Pages
    if !report.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Links |\n");
        md.push_str("|-----|-------|\n");

        for page in report.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("| {} | {} |\n", page.url, page.links.len()));
        }
        if report.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.pages.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    // Failures
    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for failure in &report.failures {
            md.push_str(&format!(
                "| {} | {} |\n",
                failure.url,
                failure.error.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}
