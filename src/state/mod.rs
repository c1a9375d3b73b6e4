//! State module for tracking crawl progress
//!
//! - `WorkerState`: where each crawl worker is within its dequeue/fetch loop

mod worker_state;

pub use worker_state::WorkerState;
