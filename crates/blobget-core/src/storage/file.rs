//! Preallocated output file written with positioned writes.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::OutputSink;

/// Output file sized to the object up front. Workers share it by reference;
/// every write carries its own offset, so no cursor or lock is involved.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Create (or truncate) `path` and reserve `size` bytes for the object.
    pub fn create(path: &Path, size: u64) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("cannot open {} for writing", path.display()))?;
        reserve(&file, size)
            .with_context(|| format!("cannot reserve {} bytes for {}", size, path.display()))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush data and metadata; call before `persist`.
    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("cannot sync {}", self.path.display()))
    }

    /// Close the file and move it to `final_path` (same filesystem only).
    pub fn persist(self, final_path: &Path) -> Result<()> {
        let FileSink { file, path } = self;
        drop(file);
        std::fs::rename(&path, final_path).with_context(|| {
            format!("cannot move {} to {}", path.display(), final_path.display())
        })
    }
}

/// Real block allocation where the platform offers it, a sparse length elsewhere.
fn reserve(file: &File, size: u64) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        if size > 0 {
            let r = unsafe { libc::posix_fallocate(file.as_raw_fd(), 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate unavailable, using set_len");
        }
    }
    file.set_len(size)
}

impl OutputSink for FileSink {
    #[cfg(unix)]
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(data, offset)
    }

    #[cfg(windows)]
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut done = 0usize;
        while done < data.len() {
            let n = self.file.seek_write(&data[done..], offset + done as u64)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
            }
            done += n;
        }
        Ok(())
    }
}
