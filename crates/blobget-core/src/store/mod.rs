//! Blob store clients.
//!
//! The downloader only needs two operations from a store: the object's size
//! and a ranged read that streams bytes back in order. `HttpBlobStore` speaks
//! plain HTTP (HEAD + `Range` GET) against path-style S3-compatible endpoints;
//! `MemoryBlobStore` serves objects from RAM.

mod error;
mod http;
mod memory;
mod parse;

pub use error::StoreError;
pub use http::{HttpBlobStore, HttpOptions};
pub use memory::MemoryBlobStore;

use std::io;
use std::sync::atomic::AtomicBool;

use crate::job::ObjectRef;
use crate::planner::ByteRange;

/// Read side of a blob store. Implementations must be usable from many worker threads.
pub trait BlobStore: Send + Sync {
    /// Total byte length of `object`.
    fn object_size(&self, object: &ObjectRef) -> Result<u64, StoreError>;

    /// Read `range` of `object`, handing bytes to `on_chunk` in order.
    ///
    /// If `on_chunk` fails the read stops and the error comes back as
    /// [`StoreError::Sink`]. Once `abort` is raised the read gives up with
    /// [`StoreError::Aborted`], even while waiting on a silent peer. A
    /// successful return means the store considers the range delivered;
    /// checking the byte count is the caller's job.
    fn read_range(
        &self,
        object: &ObjectRef,
        range: ByteRange,
        abort: &AtomicBool,
        on_chunk: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<(), StoreError>;
}
