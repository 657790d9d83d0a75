//! Periodic sampling of a [`ProgressTracker`].

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{ProgressObserver, ProgressSnapshot, ProgressTracker};

/// One-shot completion flag a sampler can wait on.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    done: Mutex<bool>,
    cv: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cv.notify_all();
    }

    pub fn is_complete(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait up to `timeout` for completion. Returns true once completed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Snapshots taken every interval; ends for good once the signal fires.
pub struct Ticks<'a> {
    tracker: &'a ProgressTracker,
    interval: Duration,
    done: &'a CompletionSignal,
    ended: bool,
}

impl<'a> Ticks<'a> {
    pub(super) fn new(
        tracker: &'a ProgressTracker,
        interval: Duration,
        done: &'a CompletionSignal,
    ) -> Self {
        Self {
            tracker,
            interval,
            done,
            ended: false,
        }
    }
}

impl Iterator for Ticks<'_> {
    type Item = ProgressSnapshot;

    fn next(&mut self) -> Option<ProgressSnapshot> {
        if self.ended || self.done.wait_timeout(self.interval) {
            self.ended = true;
            return None;
        }
        Some(self.tracker.sample())
    }
}

/// Background thread driving a tracker's ticks into an observer.
pub struct Sampler;

impl Sampler {
    pub fn spawn(
        tracker: ProgressTracker,
        interval: Duration,
        mut observer: Box<dyn ProgressObserver>,
    ) -> SamplerHandle {
        let done = Arc::new(CompletionSignal::new());
        let signal = Arc::clone(&done);
        let thread = std::thread::spawn(move || {
            for snapshot in tracker.ticks(interval, &signal) {
                observer.on_progress(&snapshot);
            }
            observer.on_finish(&tracker.sample());
        });
        SamplerHandle {
            done,
            thread: Some(thread),
        }
    }
}

/// Stops the sampler on `finish` or drop.
pub struct SamplerHandle {
    done: Arc<CompletionSignal>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Fire the completion signal and wait for the final `on_finish`.
    pub fn finish(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.done.complete();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("progress observer panicked");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
