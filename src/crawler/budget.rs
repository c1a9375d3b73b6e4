//! Page budget shared by all workers
//!
//! A worker reserves a slot before dispatching a fetch. A successful fetch
//! commits the slot, a failed one releases it. Because reservations count
//! against the maximum, concurrent fetches can never push the number of
//! crawled pages past the budget.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Outcome of [`CrawlBudget::reserve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// A slot is held; the caller must `commit` or `release` it
    Granted,
    /// The budget is used up; no further fetches are dispatched
    Exhausted,
}

#[derive(Debug, Default)]
struct BudgetState {
    crawled: usize,
    reserved: usize,
}

/// Counter of successfully crawled pages compared against an optional maximum
#[derive(Debug)]
pub struct CrawlBudget {
    max_pages: Option<usize>,
    state: Mutex<BudgetState>,
    released: Notify,
}

impl CrawlBudget {
    /// Creates a budget; `None` means unbounded
    pub fn new(max_pages: Option<usize>) -> Self {
        Self {
            max_pages,
            state: Mutex::new(BudgetState::default()),
            released: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true once the crawled count has reached the maximum
    pub fn is_exhausted(&self) -> bool {
        match self.max_pages {
            Some(max) => self.lock().crawled >= max,
            None => false,
        }
    }

    /// Reserves a slot for one fetch
    ///
    /// When every remaining slot is held by an in-flight fetch, waits until
    /// one of them commits (possibly exhausting the budget) or releases.
    pub async fn reserve(&self) -> Reservation {
        let Some(max) = self.max_pages else {
            return Reservation::Granted;
        };

        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.crawled >= max {
                    return Reservation::Exhausted;
                }
                if state.crawled + state.reserved < max {
                    state.reserved += 1;
                    return Reservation::Granted;
                }
            }

            notified.await;
        }
    }

    /// Converts a reservation into a crawled page; returns the new crawled count
    pub fn commit(&self) -> usize {
        let crawled = {
            let mut state = self.lock();
            if self.max_pages.is_some() {
                state.reserved = state.reserved.saturating_sub(1);
            }
            state.crawled += 1;
            state.crawled
        };
        self.released.notify_waiters();
        crawled
    }

    /// Gives back a reservation whose fetch did not produce a page
    pub fn release(&self) {
        if self.max_pages.is_some() {
            let mut state = self.lock();
            state.reserved = state.reserved.saturating_sub(1);
        }
        self.released.notify_waiters();
    }

    /// Number of pages crawled so far
    pub fn crawled(&self) -> usize {
        self.lock().crawled
    }

    /// The configured maximum, if any
    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }
}
