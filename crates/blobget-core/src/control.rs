//! Cooperative cancellation for a running download.
//!
//! The downloader polls the token between dispatches; once set, no new parts
//! are admitted, in-flight reads stop at their next chunk and the job fails
//! with [`crate::error::DownloadError::Aborted`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
