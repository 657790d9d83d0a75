//! Retry and backoff policy.
//!
//! Classifies part failures (timeouts, throttling, connection failures,
//! store inconsistencies) and decides exponential backoff so the downloader
//! treats every store the same way.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_http_status, classify_store_error};
pub use error::PartError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy, MAX_BACKOFF};
