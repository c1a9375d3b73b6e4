//! Crawl result records

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A successfully fetched page and the hrefs it contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: String,

    /// Raw href values in document order, duplicates and off-site links included
    pub links: Vec<String>,
}

/// A URL whose fetch failed after all attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub url: String,
    pub error: String,
}

/// Final result of a crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub pages_crawled: usize,

    /// Pages in completion order
    pub pages: Vec<PageRecord>,
    pub failures: Vec<FailureRecord>,
    pub generated_at: DateTime<Utc>,

    /// SHA-256 of the configuration file, when one was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl CrawlReport {
    /// An empty report for a crawl that fetched nothing
    pub fn empty(start_url: impl Into<String>) -> Self {
        Self::from_records(start_url, Vec::new(), Vec::new())
    }

    /// Builds a report from collected records; `pages_crawled` is derived
    pub fn from_records(
        start_url: impl Into<String>,
        pages: Vec<PageRecord>,
        failures: Vec<FailureRecord>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            pages_crawled: pages.len(),
            pages,
            failures,
            generated_at: Utc::now(),
            config_hash: None,
        }
    }

    /// Attaches the configuration file hash
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Total number of links across all pages, duplicates included
    pub fn total_links(&self) -> usize {
        self.pages.iter().map(|p| p.links.len()).sum()
    }

    /// Whether a page record exists for `url`
    pub fn contains_page(&self, url: &str) -> bool {
        self.pages.iter().any(|p| p.url == url)
    }
}
