//! Crawl worker
//!
//! Each worker is a tokio task running the per-URL state machine described by
//! [`WorkerState`]. Workers share the frontier, budget, rate limiter and robots
//! policy, each owns its own [`Fetcher`], and results are sent to the
//! coordinator over a channel in completion order. Errors never escape the
//! loop: a failed fetch becomes a [`FailureRecord`] and the worker moves on.

use crate::crawler::budget::{CrawlBudget, Reservation};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::report::{FailureRecord, PageRecord};
use crate::robots::RobotsPolicy;
use crate::state::WorkerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Result of one unit of work that produced a record
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Page(PageRecord),
    Failure(FailureRecord),
}

/// Shared resources injected into every worker by the coordinator
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub budget: Arc<CrawlBudget>,
    pub limiter: Arc<RateLimiter>,
    pub robots: Arc<RobotsPolicy>,

    /// How long to wait for work before stopping
    pub idle_timeout: Duration,

    pub outcomes: UnboundedSender<WorkerOutcome>,
}

/// Per-worker counters returned when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    /// Units dequeued, including discarded ones
    pub units: usize,
    pub pages: usize,
    pub failures: usize,
}

/// Completes the unit of work when dropped, so the frontier's barrier is
/// released on every path out of a unit, unwinding included.
struct UnitOfWork(Arc<Frontier>);

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// A single crawl worker
pub struct CrawlWorker {
    id: usize,
    fetcher: Fetcher,
    ctx: WorkerContext,
    state: WorkerState,
    stats: WorkerStats,
}

impl CrawlWorker {
    pub fn new(id: usize, fetcher: Fetcher, ctx: WorkerContext) -> Self {
        Self {
            id,
            fetcher,
            ctx,
            state: WorkerState::Idle,
            stats: WorkerStats {
                id,
                ..WorkerStats::default()
            },
        }
    }

    /// Current position in the state machine
    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Worker {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }

    /// Runs until no work arrives within the idle timeout or the frontier closes
    pub async fn run(mut self) -> WorkerStats {
        tracing::debug!("Worker {} started", self.id);

        loop {
            self.transition(WorkerState::Dequeuing);
            let Some(url) = self.ctx.frontier.try_dequeue(self.ctx.idle_timeout).await else {
                self.transition(WorkerState::Stopped);
                break;
            };

            let unit = UnitOfWork(Arc::clone(&self.ctx.frontier));
            self.stats.units += 1;
            self.process(&url).await;
            drop(unit);

            self.transition(WorkerState::Idle);
        }

        tracing::debug!(
            "Worker {} stopped: {} units, {} pages, {} failures",
            self.id,
            self.stats.units,
            self.stats.pages,
            self.stats.failures
        );
        self.stats
    }

    /// Processes one dequeued URL; the caller completes the unit afterwards
    async fn process(&mut self, url: &str) {
        self.transition(WorkerState::RobotsCheck);
        if !self.ctx.robots.is_allowed(url) {
            tracing::debug!("Disallowed by robots.txt: {}", url);
            return;
        }

        self.transition(WorkerState::BudgetCheck);
        if self.ctx.budget.reserve().await == Reservation::Exhausted {
            tracing::debug!("Page budget exhausted, discarding {}", url);
            return;
        }
        if !self.ctx.frontier.mark_processed(url) {
            self.ctx.budget.release();
            tracing::debug!("Already processed, skipping {}", url);
            return;
        }

        self.transition(WorkerState::Pacing);
        self.ctx.limiter.await_turn().await;

        self.transition(WorkerState::Fetching);
        let body = match self.fetcher.fetch(url, &self.ctx.limiter).await {
            Ok(body) => body,
            Err(e) => {
                self.ctx.budget.release();
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.stats.failures += 1;
                self.emit(WorkerOutcome::Failure(FailureRecord {
                    url: url.to_string(),
                    error: e.to_string(),
                }));
                return;
            }
        };

        self.transition(WorkerState::Parsing);
        let hrefs = extract_links(&body);
        let crawled = self.ctx.budget.commit();
        self.stats.pages += 1;
        tracing::info!(
            "Crawled {} ({} links, {} pages so far)",
            url,
            hrefs.len(),
            crawled
        );

        self.transition(WorkerState::Enqueuing);
        if self.ctx.budget.is_exhausted() {
            tracing::debug!("Page budget reached, not following links from {}", url);
        } else {
            let scope = self.ctx.frontier.scope();
            let added = hrefs
                .iter()
                .filter_map(|href| scope.resolve_in_scope(url, href))
                .filter(|absolute| self.ctx.frontier.enqueue_if_new(absolute))
                .count();
            tracing::debug!("Enqueued {} new URLs from {}", added, url);
        }

        self.emit(WorkerOutcome::Page(PageRecord {
            url: url.to_string(),
            links: hrefs,
        }));
    }

    fn emit(&self, outcome: WorkerOutcome) {
        if self.ctx.outcomes.send(outcome).is_err() {
            tracing::error!("Worker {}: result channel closed, record dropped", self.id);
        }
    }
}
