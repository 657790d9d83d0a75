//! Progress accounting for a running download.
//!
//! Fetchers add committed bytes to a per-job [`SharedCounter`]; the
//! [`ProgressTracker`] turns it into [`ProgressSnapshot`]s and a [`Sampler`]
//! thread feeds them to a [`ProgressObserver`] at a fixed interval.

mod counter;
mod sampler;
mod snapshot;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use counter::SharedCounter;
pub use sampler::{CompletionSignal, Sampler, SamplerHandle, Ticks};
pub use snapshot::ProgressSnapshot;

/// Receives snapshots from a sampler thread.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot);

    /// Called once with a last snapshot after the job stopped, successful or not.
    fn on_finish(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Read side of one job's counter. Clones share the counter.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    counter: Arc<SharedCounter>,
    total: u64,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self::with_counter(Arc::new(SharedCounter::new()), total)
    }

    pub fn with_counter(counter: Arc<SharedCounter>, total: u64) -> Self {
        Self { counter, total }
    }

    pub fn counter(&self) -> &Arc<SharedCounter> {
        &self.counter
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Current progress. Never blocks; never exceeds the total.
    pub fn sample(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_done: self.counter.get().min(self.total),
            bytes_total: self.total,
            timestamp: Instant::now(),
        }
    }

    /// One snapshot per `interval` until `done` fires.
    pub fn ticks<'a>(&'a self, interval: Duration, done: &'a CompletionSignal) -> Ticks<'a> {
        Ticks::new(self, interval, done)
    }
}
