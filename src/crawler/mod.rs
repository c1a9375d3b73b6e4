//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - The shared frontier, page budget and politeness rate limiter
//! - Crawl workers and overall crawl coordination

mod budget;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod rate_limiter;
mod report;
mod worker;

pub use budget::{CrawlBudget, Reservation};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchCause, FetchError, Fetcher, RetryPolicy};
pub use frontier::{Frontier, FrontierStats};
pub use parser::extract_links;
pub use rate_limiter::{effective_interval, RateLimiter};
pub use report::{CrawlReport, FailureRecord, PageRecord};
pub use worker::{CrawlWorker, WorkerContext, WorkerOutcome, WorkerStats};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP clients
/// 2. Load robots.txt for the seed's site
/// 3. Seed the frontier and start the workers
/// 4. Fetch pages and follow in-scope links until the frontier drains
/// 5. Return the report of crawled pages and failures
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    run_crawl(config).await
}
