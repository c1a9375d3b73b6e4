//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the crawl's lifecycle:
//! - Validating configuration and building one HTTP client per worker
//! - Loading the robots policy once, before any page is fetched
//! - Seeding the frontier and spawning the worker pool
//! - Waiting on the frontier's completion barrier, then shutting workers down
//! - Collecting page and failure records into the final report

use crate::config::{validate, Config};
use crate::crawler::budget::CrawlBudget;
use crate::crawler::fetcher::{build_http_client, Fetcher, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::rate_limiter::{effective_interval, RateLimiter};
use crate::crawler::report::CrawlReport;
use crate::crawler::worker::{CrawlWorker, WorkerContext, WorkerOutcome, WorkerStats};
use crate::robots::load_policy;
use crate::url::CrawlScope;
use crate::{CrawlError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// How long workers get to exit once the frontier is closed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Interval between progress log lines
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    seed: Url,
    robots_client: Client,
    fetchers: Vec<Fetcher>,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - Invalid configuration or HTTP client construction
    ///   failure; nothing has been fetched
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;
        let seed = Url::parse(&config.crawler.seed_url)?;

        let user_agent = config.user_agent.header_value();
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let retry = RetryPolicy {
            max_attempts: config.crawler.max_attempts,
            base_delay: Duration::from_millis(config.crawler.retry_backoff_ms),
            ..RetryPolicy::default()
        };

        let robots_client =
            build_http_client(&user_agent, timeout).map_err(CrawlError::HttpClient)?;

        let fetchers = (0..config.crawler.workers)
            .map(|_| build_http_client(&user_agent, timeout).map(|c| Fetcher::new(c, retry)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CrawlError::HttpClient)?;

        tracing::debug!("Built {} fetchers with user agent {}", fetchers.len(), user_agent);

        Ok(Self {
            config,
            seed,
            robots_client,
            fetchers,
            config_hash: None,
        })
    }

    /// Records the configuration file hash in the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// The parsed seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Number of workers that will be spawned
    pub fn worker_count(&self) -> usize {
        self.fetchers.len()
    }

    /// Runs the crawl to completion and returns its report
    ///
    /// Per-page failures never fail the run; the report is produced even
    /// when every fetch failed.
    pub async fn run(mut self) -> Result<CrawlReport> {
        let start_time = std::time::Instant::now();
        let start_url = self.seed.to_string();
        tracing::info!(
            "Starting crawl of {} with {} workers",
            start_url,
            self.worker_count()
        );

        let robots = load_policy(
            &self.robots_client,
            &self.seed,
            self.config.user_agent.product_token(),
        )
        .await;

        if !robots.is_allowed(&start_url) {
            tracing::warn!("Seed {} is disallowed by robots.txt, nothing to crawl", start_url);
            return Ok(self.finish(CrawlReport::empty(start_url)));
        }

        let configured = Duration::from_millis(self.config.crawler.politeness_delay_ms);
        let interval = effective_interval(configured, &robots);
        if interval > configured {
            tracing::info!("Using robots.txt crawl delay of {:?}", interval);
        }

        let scope =
            CrawlScope::new(&self.seed).with_configured_seed(&self.config.crawler.seed_url);
        let frontier = Arc::new(Frontier::new(scope));
        frontier.enqueue_if_new(&start_url);

        let (outcomes_tx, mut outcomes_rx) = mpsc::unbounded_channel();
        let ctx = WorkerContext {
            frontier: Arc::clone(&frontier),
            budget: Arc::new(CrawlBudget::new(self.config.crawler.max_pages)),
            limiter: Arc::new(RateLimiter::new(interval)),
            robots: Arc::new(robots),
            idle_timeout: Duration::from_millis(self.config.crawler.idle_timeout_ms),
            outcomes: outcomes_tx,
        };

        // Each worker takes ownership of its fetcher and connection pool
        let mut workers = JoinSet::new();
        for (id, fetcher) in std::mem::take(&mut self.fetchers).into_iter().enumerate() {
            workers.spawn(CrawlWorker::new(id, fetcher, ctx.clone()).run());
        }
        drop(ctx);

        wait_for_drain(&frontier, &mut workers).await;
        frontier.close();
        shutdown_workers(&mut workers).await;

        let mut pages = Vec::new();
        let mut failures = Vec::new();
        while let Ok(outcome) = outcomes_rx.try_recv() {
            match outcome {
                WorkerOutcome::Page(page) => pages.push(page),
                WorkerOutcome::Failure(failure) => failures.push(failure),
            }
        }

        let report = CrawlReport::from_records(start_url, pages, failures);
        tracing::info!(
            "Crawl completed: {} pages crawled, {} failures in {:?}",
            report.pages_crawled,
            report.failures.len(),
            start_time.elapsed()
        );

        Ok(self.finish(report))
    }

    fn finish(&self, report: CrawlReport) -> CrawlReport {
        match &self.config_hash {
            Some(hash) => report.with_config_hash(hash.clone()),
            None => report,
        }
    }
}

/// Waits until the frontier drains or every worker has exited
async fn wait_for_drain(frontier: &Frontier, workers: &mut JoinSet<WorkerStats>) {
    let drained = frontier.wait_drained();
    tokio::pin!(drained);

    let mut progress = tokio::time::interval(PROGRESS_INTERVAL);
    progress.tick().await;

    loop {
        tokio::select! {
            _ = &mut drained => {
                tracing::debug!("Frontier drained");
                return;
            }
            joined = workers.join_next() => match joined {
                Some(result) => log_worker_exit(result),
                None => {
                    let stats = frontier.stats();
                    if stats.outstanding > 0 {
                        tracing::error!(
                            "All workers exited with {} units of work outstanding",
                            stats.outstanding
                        );
                    }
                    return;
                }
            },
            _ = progress.tick() => {
                let stats = frontier.stats();
                tracing::info!(
                    "Progress: {} processed, {} queued, {} discovered",
                    stats.processed,
                    stats.pending,
                    stats.discovered
                );
            }
        }
    }
}

/// Joins the remaining workers, aborting any that outlive the grace period
async fn shutdown_workers(workers: &mut JoinSet<WorkerStats>) {
    let joined = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(result) = workers.join_next().await {
            log_worker_exit(result);
        }
    })
    .await;

    if joined.is_err() {
        tracing::warn!(
            "{} workers still running after {:?}, aborting",
            workers.len(),
            SHUTDOWN_GRACE
        );
        workers.abort_all();
        while workers.join_next().await.is_some() {}
    }
}

fn log_worker_exit(result: std::result::Result<WorkerStats, tokio::task::JoinError>) {
    match result {
        Ok(stats) => tracing::debug!(
            "Worker {} exited after {} units",
            stats.id,
            stats.units
        ),
        Err(e) if e.is_panic() => tracing::error!("Crawl worker panicked (this is a bug): {}", e),
        Err(e) => tracing::debug!("Crawl worker cancelled: {}", e),
    }
}

/// Runs a complete crawl for `config`
///
/// # Example
///
/// ```no_run
/// use webcrawler::config::Config;
/// use webcrawler::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::for_seed("https://example.com/")).await?;
/// println!("{} pages", report.pages_crawled);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    Coordinator::new(config)?.run().await
}
