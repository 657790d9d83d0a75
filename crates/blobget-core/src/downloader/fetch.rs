//! One attempt at one part: ranged read from the store, positioned writes to the sink.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::job::ObjectRef;
use crate::planner::Part;
use crate::progress::SharedCounter;
use crate::retry::PartError;
use crate::storage::OutputSink;
use crate::store::{BlobStore, StoreError};

/// Fetches `part` and writes it at `part.offset`. On success exactly
/// `part.length` bytes were written and added to `counter`; a failed attempt
/// leaves the counter untouched. Never writes past the part's end.
pub(super) fn fetch_part(
    store: &dyn BlobStore,
    object: &ObjectRef,
    part: &Part,
    sink: &dyn OutputSink,
    counter: &SharedCounter,
    abort: &AtomicBool,
) -> Result<u64, PartError> {
    let mut received = 0u64;
    let mut stop: Option<PartError> = None;

    let result = store.read_range(object, part.range(), abort, &mut |chunk| {
        if abort.load(Ordering::Relaxed) {
            stop = Some(PartError::Aborted);
            return Err(io::Error::new(io::ErrorKind::Interrupted, "aborted"));
        }
        let len = chunk.len() as u64;
        if received + len > part.length {
            stop = Some(PartError::RangeMismatch {
                expected: part.length,
                received: received + len,
            });
            return Err(io::Error::new(io::ErrorKind::InvalidData, "range overrun"));
        }
        if let Err(e) = sink.write_at(part.offset + received, chunk) {
            stop = Some(PartError::Storage(e));
            return Err(io::Error::new(io::ErrorKind::Other, "sink write failed"));
        }
        received += len;
        Ok(())
    });

    if let Some(e) = stop {
        return Err(e);
    }
    match result {
        Ok(()) => {}
        Err(StoreError::Aborted) => return Err(PartError::Aborted),
        Err(e) => return Err(e.into()),
    }

    if received != part.length {
        return Err(PartError::RangeMismatch {
            expected: part.length,
            received,
        });
    }
    counter.add(received);
    Ok(received)
}
