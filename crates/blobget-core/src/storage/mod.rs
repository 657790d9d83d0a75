//! Output sinks and file lifecycle.
//!
//! A sink accepts writes at absolute offsets and is shared by every worker of
//! a job. Parts cover disjoint regions, so sinks only need `write_at` to be
//! safe for concurrent use at non-overlapping offsets. [`FileSink`] reserves
//! the object size up front, writes with pwrite and is persisted by renaming
//! the `.part` file to the final name.

mod file;
mod memory;

pub use file::FileSink;
pub use memory::MemorySink;

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Random-access destination for downloaded bytes.
pub trait OutputSink: Send + Sync {
    /// Write all of `data` starting at `offset`. Must not move any shared cursor.
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()>;
}

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
