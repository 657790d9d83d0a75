use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes committed by completed parts of one job.
///
/// Only a part that fetched its full length adds to it, so the value never
/// exceeds the job size and never goes back.
#[derive(Debug, Default)]
pub struct SharedCounter(AtomicU64);

impl SharedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
