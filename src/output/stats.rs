//! Summary statistics derived from a crawl report

use crate::crawler::CrawlReport;
use std::collections::HashSet;

/// Aggregate numbers describing a finished crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    pub start_url: String,
    pub generated_at: String,
    pub config_hash: Option<String>,

    pub pages_crawled: usize,
    pub failures: usize,

    /// Hrefs across all pages, duplicates included
    pub total_links: usize,

    /// Distinct href values across all pages
    pub unique_links: usize,
}

impl CrawlSummary {
    /// Computes the summary for `report`
    pub fn from_report(report: &CrawlReport) -> Self {
        let unique_links = report
            .pages
            .iter()
            .flat_map(|page| page.links.iter().map(String::as_str))
            .collect::<HashSet<_>>()
            .len();

        Self {
            start_url: report.start_url.clone(),
            generated_at: report.generated_at.to_rfc3339(),
            config_hash: report.config_hash.clone(),
            pages_crawled: report.pages_crawled,
            failures: report.failures.len(),
            total_links: report.total_links(),
            unique_links,
        }
    }

    /// Fetch attempts that ended in a page or a failure
    pub fn total_attempted(&self) -> usize {
        self.pages_crawled + self.failures
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_crawled as f64 / attempted as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FailureRecord, PageRecord};

    fn page(url: &str, links: &[&str]) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = CrawlReport::from_records(
            "https://x.test/",
            vec![
                page("https://x.test/", &["/a", "/b", "/a"]),
                page("https://x.test/a", &["/b", "https://other.test/"]),
            ],
            vec![FailureRecord {
                url: "https://x.test/b".to_string(),
                error: "HTTP 500".to_string(),
            }],
        );

        let summary = CrawlSummary::from_report(&report);
        assert_eq!(summary.pages_crawled, 2);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.total_links, 5);
        assert_eq!(summary.unique_links, 3);
        assert!((summary.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        let summary = CrawlSummary::from_report(&CrawlReport::empty("https://x.test/"));
        assert_eq!(summary.total_attempted(), 0);
        assert_eq!(summary.success_rate(), 0.0);
    }
}
