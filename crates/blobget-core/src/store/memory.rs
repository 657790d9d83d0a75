//! In-memory blob store.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{BlobStore, StoreError};
use crate::job::ObjectRef;
use crate::planner::ByteRange;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Serves objects from RAM, streaming ranges in `chunk_size` pieces.
/// A range running past the end of an object is served short.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    objects: HashMap<ObjectRef, Arc<Vec<u8>>>,
    denied: HashSet<ObjectRef>,
    chunk_size: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            denied: HashSet::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn insert(&mut self, object: ObjectRef, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(object, Arc::new(bytes.into()));
    }

    /// Make every request for `object` fail with `AccessDenied`.
    pub fn deny(&mut self, object: ObjectRef) {
        self.denied.insert(object);
    }

    fn lookup(&self, object: &ObjectRef) -> Result<&Arc<Vec<u8>>, StoreError> {
        if self.denied.contains(object) {
            return Err(StoreError::AccessDenied);
        }
        self.objects.get(object).ok_or(StoreError::NotFound)
    }
}

impl BlobStore for MemoryBlobStore {
    fn object_size(&self, object: &ObjectRef) -> Result<u64, StoreError> {
        Ok(self.lookup(object)?.len() as u64)
    }

    fn read_range(
        &self,
        object: &ObjectRef,
        range: ByteRange,
        abort: &AtomicBool,
        on_chunk: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<(), StoreError> {
        let body = self.lookup(object)?;
        let len = body.len() as u64;
        if range.start >= len && !range.is_empty() {
            return Err(StoreError::Protocol(format!(
                "range {} not satisfiable for {} bytes",
                range, len
            )));
        }
        let start = range.start.min(len) as usize;
        let end = range.end.min(len) as usize;
        for chunk in body[start..end].chunks(self.chunk_size) {
            if abort.load(Ordering::Relaxed) {
                return Err(StoreError::Aborted);
            }
            on_chunk(chunk).map_err(StoreError::Sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(store: &MemoryBlobStore, object: &ObjectRef, range: ByteRange) -> Result<(Vec<u8>, usize), StoreError> {
        let mut out = Vec::new();
        let mut chunks = 0;
        store.read_range(object, range, &AtomicBool::new(false), &mut |c| {
            out.extend_from_slice(c);
            chunks += 1;
            Ok(())
        })?;
        Ok((out, chunks))
    }

    #[test]
    fn serves_ranges_in_chunks() {
        let obj = ObjectRef::new("b", "k");
        let mut store = MemoryBlobStore::new().with_chunk_size(4);
        store.insert(obj.clone(), (0u8..20).collect::<Vec<_>>());
        assert_eq!(store.object_size(&obj).unwrap(), 20);
        let (bytes, chunks) = read_all(&store, &obj, ByteRange { start: 5, end: 15 }).unwrap();
        assert_eq!(bytes, (5u8..15).collect::<Vec<_>>());
        assert_eq!(chunks, 3);
    }

    #[test]
    fn short_read_past_end() {
        let obj = ObjectRef::new("b", "k");
        let mut store = MemoryBlobStore::new();
        store.insert(obj.clone(), vec![1u8; 10]);
        let (bytes, _) = read_all(&store, &obj, ByteRange { start: 8, end: 20 }).unwrap();
        assert_eq!(bytes.len(), 2);
        assert!(read_all(&store, &obj, ByteRange { start: 10, end: 20 }).is_err());
    }

    #[test]
    fn missing_and_denied_objects() {
        let mut store = MemoryBlobStore::new();
        let secret = ObjectRef::new("b", "secret");
        store.insert(secret.clone(), vec![0u8; 4]);
        store.deny(secret.clone());
        assert!(matches!(store.object_size(&secret), Err(StoreError::AccessDenied)));
        assert!(matches!(
            store.object_size(&ObjectRef::new("b", "nope")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn callback_error_stops_read() {
        let obj = ObjectRef::new("b", "k");
        let mut store = MemoryBlobStore::new().with_chunk_size(2);
        store.insert(obj.clone(), vec![0u8; 10]);
        let mut calls = 0;
        let err = store
            .read_range(&obj, ByteRange { start: 0, end: 10 }, &AtomicBool::new(false), &mut |_| {
                calls += 1;
                Err(io::Error::new(io::ErrorKind::Other, "full"))
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Sink(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn abort_flag_stops_between_chunks() {
        let obj = ObjectRef::new("b", "k");
        let mut store = MemoryBlobStore::new().with_chunk_size(2);
        store.insert(obj.clone(), vec![0u8; 10]);
        let abort = AtomicBool::new(false);
        let mut calls = 0;
        let err = store
            .read_range(&obj, ByteRange { start: 0, end: 10 }, &abort, &mut |_| {
                calls += 1;
                if calls == 2 {
                    abort.store(true, Ordering::Relaxed);
                }
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Aborted));
        assert_eq!(calls, 2);
    }
}
