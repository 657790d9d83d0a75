//! Download job description: which object, how large it is, and how to split it.

use std::fmt;

use crate::error::DownloadError;

/// Identifies one object in the store: bucket (or container) plus key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Key without leading slashes (`/a/b.bin` and `a/b.bin` name the same object).
    pub fn normalized_key(&self) -> &str {
        self.key.trim_start_matches('/')
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.normalized_key())
    }
}

/// One ranged download of one object. Immutable once built; `new` enforces
/// `part_size > 0`, `concurrency >= 1` and a part count that fits a `u32` index.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    object: ObjectRef,
    total_size: u64,
    part_size: u64,
    concurrency: u32,
}

impl DownloadJob {
    pub fn new(
        object: ObjectRef,
        total_size: u64,
        part_size: u64,
        concurrency: u32,
    ) -> Result<Self, DownloadError> {
        if part_size == 0 {
            return Err(DownloadError::InvalidJob(
                "part size must be greater than zero".to_string(),
            ));
        }
        if concurrency == 0 {
            return Err(DownloadError::InvalidJob(
                "concurrency must be at least 1".to_string(),
            ));
        }
        let parts = total_size.div_ceil(part_size);
        if parts > u64::from(u32::MAX) {
            return Err(DownloadError::InvalidJob(format!(
                "{} parts of {} bytes exceed the part index range; use a larger part size",
                parts, part_size
            )));
        }
        Ok(Self {
            object,
            total_size,
            part_size,
            concurrency,
        })
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    /// Number of parts the planner will produce for this job.
    pub fn part_count(&self) -> u64 {
        self.total_size.div_ceil(self.part_size)
    }
}
