//! In-memory sink, for tests and callers that want the object in RAM.

use std::io;
use std::sync::{Mutex, PoisonError};

use super::OutputSink;

/// Growable byte buffer behind a mutex. Writes past the end zero-fill the gap.
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink pre-sized to `len` zero bytes, like a preallocated file.
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: Mutex::new(vec![0; len]),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for MemorySink {
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds memory"))?;
        let end = start
            .checked_add(data.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset overflow"))?;
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[start..end].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_writes_land_at_offsets() {
        let sink = MemorySink::new();
        sink.write_at(6, b"world").unwrap();
        sink.write_at(0, b"hello ").unwrap();
        assert_eq!(sink.into_inner(), b"hello world".to_vec());
    }

    #[test]
    fn presized_sink_keeps_length() {
        let sink = MemorySink::with_len(10);
        sink.write_at(2, b"ab").unwrap();
        assert_eq!(sink.len(), 10);
        assert_eq!(&sink.contents()[2..4], b"ab");
    }
}
