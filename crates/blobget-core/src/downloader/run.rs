//! Bounded worker pool with a single coordinator owning all part state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::fetch::fetch_part;
use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::job::ObjectRef;
use crate::planner::{Part, PartState};
use crate::progress::SharedCounter;
use crate::retry::{classify, ErrorKind, PartError, RetryDecision, RetryPolicy, MAX_BACKOFF};
use crate::storage::OutputSink;
use crate::store::BlobStore;

/// Longest the coordinator blocks before re-checking cancellation and retry timers.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Dispatch = (usize, Part);
type Completion = (usize, Result<u64, PartError>);

pub(super) struct PoolContext<'a> {
    pub store: &'a dyn BlobStore,
    pub object: &'a ObjectRef,
    pub sink: &'a dyn OutputSink,
    pub counter: &'a SharedCounter,
    pub policy: &'a RetryPolicy,
    pub cancel: Option<&'a CancelToken>,
}

impl PoolContext<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }
}

#[derive(Debug, Default)]
pub(super) struct PoolOutcome {
    pub bytes_written: u64,
    pub retries: u32,
    pub throttle_events: u32,
}

/// Runs every part to `Done` with at most `concurrency` in flight.
/// Returns on the first fatal part error; in-flight reads are told to stop
/// and their workers are joined before returning.
pub(super) fn run_pool(
    ctx: &PoolContext<'_>,
    parts: &mut [Part],
    concurrency: usize,
) -> Result<PoolOutcome, DownloadError> {
    if parts.is_empty() {
        return Ok(PoolOutcome::default());
    }

    let workers = concurrency.clamp(1, parts.len());
    let abort = AtomicBool::new(false);
    let (work_tx, work_rx) = mpsc::channel::<Dispatch>();
    let work_rx = Mutex::new(work_rx);
    let (done_tx, done_rx) = mpsc::channel::<Completion>();

    std::thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let done_tx = done_tx.clone();
            let work_rx = &work_rx;
            let abort = &abort;
            handles.push(s.spawn(move || loop {
                let next = work_rx.lock().unwrap_or_else(PoisonError::into_inner).recv();
                let Ok((slot, part)) = next else { break };
                let res = if abort.load(Ordering::Relaxed) {
                    Err(PartError::Aborted)
                } else {
                    fetch_part(ctx.store, ctx.object, &part, ctx.sink, ctx.counter, abort)
                };
                if done_tx.send((slot, res)).is_err() {
                    break;
                }
            }));
        }
        drop(done_tx);

        let lost = || handles.iter().any(|h| h.is_finished());
        let result = coordinate(ctx, parts, workers, &work_tx, &done_rx, lost);
        if result.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
        // Closing the work channel lets idle workers exit.
        drop(work_tx);
        for h in handles {
            if h.join().is_err() {
                tracing::error!("download worker panicked");
            }
        }
        result
    })
}

fn coordinate(
    ctx: &PoolContext<'_>,
    parts: &mut [Part],
    workers: usize,
    work_tx: &mpsc::Sender<Dispatch>,
    done_rx: &mpsc::Receiver<Completion>,
    workers_lost: impl Fn() -> bool,
) -> Result<PoolOutcome, DownloadError> {
    let mut outcome = PoolOutcome::default();
    let mut pending: VecDeque<usize> = (0..parts.len()).collect();
    let mut retry_after: Vec<(Instant, usize)> = Vec::new();
    let mut in_flight = 0usize;
    let mut done = 0usize;

    while done < parts.len() {
        if ctx.cancelled() {
            tracing::info!(object = %ctx.object, "download cancelled");
            return Err(DownloadError::Aborted);
        }

        let now = Instant::now();
        retry_after.retain(|&(at, slot)| {
            if at <= now {
                pending.push_back(slot);
                false
            } else {
                true
            }
        });

        while in_flight < workers {
            let Some(slot) = pending.pop_front() else { break };
            let part = &mut parts[slot];
            part.state = PartState::InFlight;
            part.attempts += 1;
            tracing::debug!(
                part = part.index,
                attempt = part.attempts,
                range = %part.range(),
                "dispatching part"
            );
            if work_tx.send((slot, *part)).is_err() {
                return Err(DownloadError::WorkerLost);
            }
            in_flight += 1;
        }

        let (slot, res) = match done_rx.recv_timeout(next_wait(&retry_after, now)) {
            Ok(completion) => completion,
            // Workers only exit once the work channel closes; one gone early has panicked.
            Err(RecvTimeoutError::Timeout) if workers_lost() => {
                return Err(DownloadError::WorkerLost)
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Err(DownloadError::WorkerLost),
        };
        in_flight -= 1;

        let part = &mut parts[slot];
        match res {
            Ok(n) => {
                part.state = PartState::Done;
                outcome.bytes_written += n;
                done += 1;
                tracing::debug!(part = part.index, bytes = n, "part complete");
            }
            Err(e) => {
                part.state = PartState::Failed;
                let kind = classify(&e);
                if kind == ErrorKind::Throttled {
                    outcome.throttle_events += 1;
                }
                match ctx.policy.decide(part.attempts, kind) {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::warn!(
                            part = part.index,
                            attempt = part.attempts,
                            ?kind,
                            ?delay,
                            error = %e,
                            "part failed, retrying"
                        );
                        outcome.retries += 1;
                        let now = Instant::now();
                        let at = now
                            .checked_add(delay)
                            .unwrap_or_else(|| now + MAX_BACKOFF);
                        retry_after.push((at, slot));
                    }
                    RetryDecision::NoRetry => {
                        if ctx.cancelled() {
                            return Err(DownloadError::Aborted);
                        }
                        return Err(DownloadError::JobFailed {
                            index: part.index,
                            attempts: part.attempts,
                            cause: e,
                        });
                    }
                }
            }
        }
    }

    Ok(outcome)
}

/// Time until the earliest retry is due, capped at the poll interval.
fn next_wait(retry_after: &[(Instant, usize)], now: Instant) -> Duration {
    retry_after
        .iter()
        .map(|&(at, _)| at.saturating_duration_since(now))
        .min()
        .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL))
}
