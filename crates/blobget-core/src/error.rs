//! Job-level error taxonomy.
//!
//! Per-part failures are [`PartError`]s; they are retried inside the
//! downloader and only the first fatal one surfaces here, wrapped in
//! [`DownloadError::JobFailed`].

use thiserror::Error;

use crate::job::ObjectRef;
use crate::retry::PartError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Metadata query said the object does not exist. Nothing was written.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectRef),

    /// Metadata query was refused. Nothing was written.
    #[error("access denied: {0}")]
    AccessDenied(ObjectRef),

    /// Metadata query failed for another reason (network, unexpected status).
    #[error("failed to query size of {object}")]
    Resolve {
        object: ObjectRef,
        #[source]
        source: StoreError,
    },

    #[error("invalid download job: {0}")]
    InvalidJob(String),

    /// A part hit a non-retryable error or ran out of attempts.
    #[error("part {index} failed after {attempts} attempt(s)")]
    JobFailed {
        index: u32,
        attempts: u32,
        #[source]
        cause: PartError,
    },

    /// Every part reported success but the byte total disagrees with the job size.
    #[error("download incomplete: wrote {written} of {expected} bytes")]
    Incomplete { expected: u64, written: u64 },

    /// Cancelled through a [`crate::control::CancelToken`].
    #[error("download aborted")]
    Aborted,

    #[error("download worker exited unexpectedly")]
    WorkerLost,
}
