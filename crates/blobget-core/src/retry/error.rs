//! Part fetch error type for retry classification.

use std::fmt;

use crate::store::StoreError;

/// Error returned by one attempt at one part.
/// Kept separate from the job error so it can be classified before the
/// downloader decides between retrying and failing the job.
#[derive(Debug)]
pub enum PartError {
    /// The store reported a failure (network, timeout, status, protocol).
    Store(StoreError),
    /// The store delivered a different number of bytes than requested.
    /// Signals an inconsistent object or store; never retried.
    RangeMismatch { expected: u64, received: u64 },
    /// Local sink write failed (disk full, permission denied). Not retried.
    Storage(std::io::Error),
    /// The job was aborted while this part was in flight.
    Aborted,
}

impl PartError {
    /// True when another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        super::classify(self).is_retryable()
    }
}

impl From<StoreError> for PartError {
    fn from(e: StoreError) -> Self {
        PartError::Store(e)
    }
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartError::Store(e) => write!(f, "{}", e),
            PartError::RangeMismatch { expected, received } => {
                write!(f, "range mismatch: expected {} bytes, got {}", expected, received)
            }
            PartError::Storage(e) => write!(f, "storage: {}", e),
            PartError::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::error::Error for PartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartError::Store(e) => Some(e),
            PartError::Storage(e) => Some(e),
            PartError::RangeMismatch { .. } | PartError::Aborted => None,
        }
    }
}
