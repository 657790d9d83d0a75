//! Part type and range planning.

use std::fmt;

/// A byte range `[start, end)` (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Inclusive last byte, as HTTP ranges express it. `None` for an empty range.
    pub fn last_byte(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }

    /// Range in the form libcurl expects: `start-(end-1)`, no unit prefix.
    pub fn curl_range(&self) -> String {
        match self.last_byte() {
            Some(last) => format!("{}-{}", self.start, last),
            None => "0-0".to_string(),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Lifecycle of one part inside the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartState {
    Pending,
    InFlight,
    Done,
    /// Last attempt failed. Terminal only once the retry policy gives up.
    Failed,
}

/// A contiguous slice of the object: the unit of concurrent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub index: u32,
    pub offset: u64,
    pub length: u64,
    pub state: PartState,
    /// Attempts started so far (the first attempt counts).
    pub attempts: u32,
}

impl Part {
    pub fn new(index: u32, offset: u64, length: u64) -> Self {
        Self {
            index,
            offset,
            length,
            state: PartState::Pending,
            attempts: 0,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    pub fn range(&self) -> ByteRange {
        ByteRange {
            start: self.offset,
            end: self.end(),
        }
    }
}

/// Builds the part plan for `total_size` bytes in parts of `part_size`.
///
/// Every part but the last is exactly `part_size` long; the last holds the
/// remainder (or a full `part_size` when it divides evenly). Returns an empty
/// vec when `total_size` or `part_size` is 0. Callers keep the part count
/// within `u32` (see [`crate::job::DownloadJob::new`]).
pub fn plan_parts(total_size: u64, part_size: u64) -> Vec<Part> {
    if total_size == 0 || part_size == 0 {
        return Vec::new();
    }

    let count = total_size.div_ceil(part_size);
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;

    for index in 0..count {
        let length = part_size.min(total_size - offset);
        out.push(Part::new(index as u32, offset, length));
        offset += length;
    }

    out
}
