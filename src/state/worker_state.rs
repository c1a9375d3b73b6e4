/// Crawl worker state definitions
///
/// A worker cycles `Idle → Dequeuing → RobotsCheck → BudgetCheck → Pacing →
/// Fetching → Parsing → Enqueuing → Idle` for every unit of work and ends in
/// `Stopped`. Any check may discard the unit and send the worker back to `Idle`.
use std::fmt;

/// Represents where a crawl worker is within its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkerState {
    /// Between units of work
    #[default]
    Idle,

    /// Waiting on the frontier for a URL
    Dequeuing,

    /// Consulting the robots policy
    RobotsCheck,

    /// Reserving a slot in the page budget and claiming the URL
    BudgetCheck,

    /// Waiting for the shared rate limiter
    Pacing,

    /// HTTP request in flight (including retry backoff)
    Fetching,

    /// Extracting hrefs from the fetched page
    Parsing,

    /// Pushing in-scope links back to the frontier
    Enqueuing,

    /// Terminal: no more work arrived before the idle timeout
    Stopped,
}

impl WorkerState {
    /// Checks whether moving from this state to `to` is a valid transition
    pub fn can_transition_to(&self, to: WorkerState) -> bool {
        use WorkerState::*;

        match (self, to) {
            (Idle, Dequeuing) => true,
            (Dequeuing, RobotsCheck) | (Dequeuing, Stopped) => true,
            // Discards: budget exhausted, robots disallow, duplicate claim
            (RobotsCheck, BudgetCheck) | (RobotsCheck, Idle) => true,
            (BudgetCheck, Pacing) | (BudgetCheck, Idle) => true,
            (Pacing, Fetching) => true,
            // A failed fetch is recorded and the unit ends
            (Fetching, Parsing) | (Fetching, Idle) => true,
            (Parsing, Enqueuing) => true,
            (Enqueuing, Idle) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dequeuing => "dequeuing",
            Self::RobotsCheck => "robots_check",
            Self::BudgetCheck => "budget_check",
            Self::Pacing => "pacing",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Enqueuing => "enqueuing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
