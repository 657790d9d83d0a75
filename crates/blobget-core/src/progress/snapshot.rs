use std::time::{Duration, Instant};

/// Point-in-time view of a job's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub timestamp: Instant,
}

impl ProgressSnapshot {
    pub fn remaining(&self) -> u64 {
        self.bytes_total.saturating_sub(self.bytes_done)
    }

    /// Completed fraction in `[0, 1]`. An empty job counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            1.0
        } else {
            self.bytes_done as f64 / self.bytes_total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_done >= self.bytes_total
    }

    /// Bytes per second between `prev` and this snapshot.
    /// `None` if no time passed or `prev` is not older.
    pub fn rate_since(&self, prev: &ProgressSnapshot) -> Option<f64> {
        let dt = self.timestamp.checked_duration_since(prev.timestamp)?;
        if dt.is_zero() {
            return None;
        }
        let delta = self.bytes_done.saturating_sub(prev.bytes_done);
        Some(delta as f64 / dt.as_secs_f64())
    }

    /// Time left at the rate observed since `prev`.
    /// `None` while the rate is unknown or zero and bytes remain.
    pub fn eta_since(&self, prev: &ProgressSnapshot) -> Option<Duration> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Some(Duration::ZERO);
        }
        let rate = self.rate_since(prev)?;
        if rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(remaining as f64 / rate).ok()
    }
}
