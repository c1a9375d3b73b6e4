//! Shared crawl frontier
//!
//! The frontier owns the FIFO queue of URLs waiting to be fetched, the
//! *discovered* and *processed* sets used for deduplication, and a counter of
//! outstanding units of work that acts as the crawl's completion barrier.
//!
//! All of it lives under one mutex so that compound decisions such as
//! "in scope, not processed and not discovered" are evaluated and acted on in
//! a single critical section. The lock is never held across an `.await`.

use crate::url::CrawlScope;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    discovered: HashSet<String>,
    processed: HashSet<String>,
    /// Units enqueued but not yet completed (queued + in flight)
    outstanding: usize,
    closed: bool,
}

/// Snapshot of frontier counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierStats {
    pub pending: usize,
    pub discovered: usize,
    pub processed: usize,
    pub outstanding: usize,
}

/// Work queue plus dedup bookkeeping shared by all crawl workers
#[derive(Debug)]
pub struct Frontier {
    scope: CrawlScope,
    state: Mutex<FrontierState>,
    work_available: Notify,
    outstanding_tx: watch::Sender<usize>,
}

impl Frontier {
    /// Creates an empty frontier accepting only URLs within `scope`
    pub fn new(scope: CrawlScope) -> Self {
        let (outstanding_tx, _) = watch::channel(0);
        Self {
            scope,
            state: Mutex::new(FrontierState::default()),
            work_available: Notify::new(),
            outstanding_tx,
        }
    }

    /// The scope this frontier enforces
    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Critical sections never panic halfway through an update, so the
        // state behind a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `url` iff it is in scope and has never been discovered or processed
    ///
    /// Returns whether the URL was enqueued. Always false once the frontier
    /// has been closed.
    pub fn enqueue_if_new(&self, url: &str) -> bool {
        if !self.scope.contains(url) {
            return false;
        }

        {
            let mut state = self.lock();
            if state.closed {
                tracing::warn!("Frontier closed, rejecting {}", url);
                return false;
            }
            if state.processed.contains(url) || state.discovered.contains(url) {
                return false;
            }

            state.discovered.insert(url.to_string());
            state.queue.push_back(url.to_string());
            state.outstanding += 1;
            self.outstanding_tx.send_replace(state.outstanding);
        }

        self.work_available.notify_one();
        true
    }

    /// Waits up to `timeout` for a URL to process
    ///
    /// Returns `None` when nothing arrives before the deadline or the frontier
    /// is closed. A returned URL is one unit of work: the caller must report
    /// it with [`Frontier::complete`] whatever happens to it.
    pub async fn try_dequeue(&self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.work_available.notified();
            tokio::pin!(notified);
            // Register before checking the queue so a concurrent push is not missed
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(url) = state.queue.pop_front() {
                    return Some(url);
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Atomically claims `url` for fetching
    ///
    /// Returns false if another worker already claimed it.
    pub fn mark_processed(&self, url: &str) -> bool {
        let mut state = self.lock();
        if !state.discovered.contains(url) {
            // Keep processed ⊆ discovered even for URLs that bypassed the queue
            state.discovered.insert(url.to_string());
        }
        state.processed.insert(url.to_string())
    }

    /// Signals that one dequeued unit of work is finished
    pub fn complete(&self) {
        let mut state = self.lock();
        match state.outstanding.checked_sub(1) {
            Some(remaining) => {
                state.outstanding = remaining;
                self.outstanding_tx.send_replace(remaining);
            }
            None => tracing::error!("Frontier::complete called with no outstanding work"),
        }
    }

    /// Waits until no URL is pending and no unit of work is in flight
    ///
    /// In-flight work may enqueue more URLs, so this is a barrier on the
    /// outstanding counter, not a check that the queue is empty.
    pub async fn wait_drained(&self) {
        let mut outstanding = self.outstanding_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = outstanding.wait_for(|count| *count == 0).await;
    }

    /// Returns true when no work is queued or in flight
    pub fn is_drained(&self) -> bool {
        self.lock().outstanding == 0
    }

    /// Closes the frontier once the barrier has been observed
    ///
    /// Later enqueues are rejected and idle workers waiting in
    /// [`Frontier::try_dequeue`] return immediately.
    pub fn close(&self) {
        self.lock().closed = true;
        self.work_available.notify_waiters();
    }

    /// Returns true after [`Frontier::close`]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether `url` has ever been enqueued
    pub fn is_discovered(&self, url: &str) -> bool {
        self.lock().discovered.contains(url)
    }

    /// Whether `url` has been claimed for fetching
    pub fn is_processed(&self, url: &str) -> bool {
        self.lock().processed.contains(url)
    }

    /// Returns the current counters
    pub fn stats(&self) -> FrontierStats {
        let state = self.lock();
        FrontierStats {
            pending: state.queue.len(),
            discovered: state.discovered.len(),
            processed: state.processed.len(),
            outstanding: state.outstanding,
        }
    }
}
