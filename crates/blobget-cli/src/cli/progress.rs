//! Single-line terminal progress: `\r<done> downloaded, <eta> remaining...`.

use blobget_core::humanize::{format_bytes_decimal, format_duration};
use blobget_core::progress::{ProgressObserver, ProgressSnapshot};
use std::io::{self, Write};

pub struct TerminalProgress<W: Write + Send> {
    out: W,
    prev: Option<ProgressSnapshot>,
    printed: bool,
}

impl TerminalProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prev: None,
            printed: false,
        }
    }

    fn line(&self, snapshot: &ProgressSnapshot) -> String {
        let eta = self
            .prev
            .as_ref()
            .and_then(|prev| snapshot.eta_since(prev))
            .map(format_duration)
            .unwrap_or_else(|| "?".to_string());
        format!(
            "\r{} downloaded, {} remaining...",
            format_bytes_decimal(snapshot.bytes_done),
            eta
        )
    }
}

impl<W: Write + Send> ProgressObserver for TerminalProgress<W> {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        let line = self.line(snapshot);
        // A closed stdout must not take the download down with it.
        let _ = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush());
        self.prev = Some(*snapshot);
        self.printed = true;
    }

    fn on_finish(&mut self, snapshot: &ProgressSnapshot) {
        let res = if snapshot.is_complete() {
            writeln!(self.out, "\rdownload is complete")
        } else if self.printed {
            writeln!(self.out)
        } else {
            Ok(())
        };
        let _ = res.and_then(|_| self.out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn snap(done: u64, total: u64, at: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_done: done,
            bytes_total: total,
            timestamp: at,
        }
    }

    fn output(p: TerminalProgress<Vec<u8>>) -> String {
        String::from_utf8(p.out).unwrap()
    }

    #[test]
    fn progress_line_shows_size_and_eta() {
        let t0 = Instant::now();
        let mut p = TerminalProgress::new(Vec::new());
        p.on_progress(&snap(0, 3_000_000, t0));
        p.on_progress(&snap(1_000_000, 3_000_000, t0 + Duration::from_secs(1)));
        assert_eq!(
            output(p),
            "\r0 B downloaded, ? remaining...\r1.0 MB downloaded, 2s remaining..."
        );
    }

    #[test]
    fn finish_reports_completion_only_when_complete() {
        let t0 = Instant::now();
        let mut done = TerminalProgress::new(Vec::new());
        done.on_finish(&snap(10, 10, t0));
        assert_eq!(output(done), "\rdownload is complete\n");

        let mut failed = TerminalProgress::new(Vec::new());
        failed.on_progress(&snap(5, 10, t0));
        failed.on_finish(&snap(5, 10, t0));
        assert!(!output(failed).contains("complete"));
    }
}
