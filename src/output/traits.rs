//! Output sink traits and types
//!
//! This module defines the trait interface for result sinks and the error
//! type shared by all of them.

use crate::crawler::CrawlReport;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for a finished crawl report
///
/// Sinks run after the crawl, on the coordinator's side, so they only ever
/// see the complete report.
pub trait ResultSink {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Emits the report
    ///
    /// # Arguments
    ///
    /// * `report` - The finished crawl report
    fn write_report(&self, report: &CrawlReport) -> OutputResult<()>;
}
