//! JSON report file

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the full report as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonReportSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write_report(&self, report: &CrawlReport) -> OutputResult<()> {
        let write_err = |source: std::io::Error| OutputError::Write {
            path: self.path.display().to_string(),
            source,
        };

        let file = File::create(&self.path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        tracing::info!("Report written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FailureRecord, PageRecord};
    use tempfile::TempDir;

    #[test]
    fn test_writes_report_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawl_output.json");
        let report = CrawlReport::from_records(
            "https://x.test/",
            vec![PageRecord {
                url: "https://x.test/".to_string(),
                links: vec!["/a".to_string()],
            }],
            vec![FailureRecord {
                url: "https://x.test/a".to_string(),
                error: "HTTP 404 Not Found (after 1 attempt(s))".to_string(),
            }],
        );

        JsonReportSink::new(&path).write_report(&report).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["start_url"], "https://x.test/");
        assert_eq!(written["pages_crawled"], 1);
        assert_eq!(written["pages"][0]["links"][0], "/a");
        assert_eq!(written["failures"][0]["error"], "HTTP 404 Not Found (after 1 attempt(s))");
    }

    #[test]
    fn test_unwritable_path_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.json");

        let err = JsonReportSink::new(&path)
            .write_report(&CrawlReport::empty("https://x.test/"))
            .unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
        assert!(err.to_string().contains("out.json"));
    }
}
