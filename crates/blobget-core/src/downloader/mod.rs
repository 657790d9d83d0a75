//! Core ranged downloader engine.
//!
//! Plans a job into parts, fetches them through a bounded pool of worker
//! threads, writes each part to the sink at its offset and retries transient
//! failures with backoff outside the pool. Progress is counted per completed
//! part so a failed attempt never inflates it.

mod fetch;
mod run;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::job::{DownloadJob, ObjectRef};
use crate::planner::plan_parts;
use crate::progress::{ProgressObserver, ProgressTracker, Sampler, SharedCounter};
use crate::resolver::resolve_size;
use crate::retry::RetryPolicy;
use crate::storage::OutputSink;
use crate::store::BlobStore;

use run::{run_pool, PoolContext};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub bytes_written: u64,
    pub parts: u32,
    /// Attempts that failed transiently and were scheduled again.
    pub retries: u32,
    pub throttle_events: u32,
    pub elapsed: Duration,
}

pub struct Downloader {
    store: Arc<dyn BlobStore>,
    retry_policy: RetryPolicy,
    cancel: Option<CancelToken>,
}

impl Downloader {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            retry_policy: RetryPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Total size of `object`, queried before anything is written.
    pub fn resolve(&self, object: &ObjectRef) -> Result<u64, DownloadError> {
        resolve_size(self.store.as_ref(), object)
    }

    /// Downloads every part of `job` into `sink`, adding committed bytes to `counter`.
    /// Succeeds only when the bytes written equal the job size.
    pub fn run(
        &self,
        job: &DownloadJob,
        sink: &dyn OutputSink,
        counter: &SharedCounter,
    ) -> Result<DownloadSummary, DownloadError> {
        let started = Instant::now();
        let mut parts = plan_parts(job.total_size(), job.part_size());
        tracing::info!(
            object = %job.object(),
            size = job.total_size(),
            parts = parts.len(),
            concurrency = job.concurrency(),
            "starting download"
        );

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(DownloadError::Aborted);
        }

        let ctx = PoolContext {
            store: self.store.as_ref(),
            object: job.object(),
            sink,
            counter,
            policy: &self.retry_policy,
            cancel: self.cancel.as_ref(),
        };
        let outcome = match run_pool(&ctx, &mut parts, job.concurrency() as usize) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(object = %job.object(), error = %e, "download failed");
                return Err(e);
            }
        };

        if outcome.bytes_written != job.total_size() {
            return Err(DownloadError::Incomplete {
                expected: job.total_size(),
                written: outcome.bytes_written,
            });
        }

        let summary = DownloadSummary {
            bytes_written: outcome.bytes_written,
            parts: parts.len() as u32,
            retries: outcome.retries,
            throttle_events: outcome.throttle_events,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            object = %job.object(),
            bytes = summary.bytes_written,
            retries = summary.retries,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "download complete"
        );
        Ok(summary)
    }

    /// Like [`run`](Self::run) with a fresh counter sampled every `interval`
    /// into `observer`. The observer's `on_finish` has run when this returns.
    pub fn run_observed(
        &self,
        job: &DownloadJob,
        sink: &dyn OutputSink,
        interval: Duration,
        observer: Box<dyn ProgressObserver>,
    ) -> Result<DownloadSummary, DownloadError> {
        let tracker = ProgressTracker::new(job.total_size());
        let sampler = Sampler::spawn(tracker.clone(), interval, observer);
        let result = self.run(job, sink, tracker.counter());
        sampler.finish();
        result
    }
}
