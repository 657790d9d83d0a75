//! `blobget` – resolve, download, finalize.

use anyhow::{Context, Result};
use blobget_core::config::BlobgetConfig;
use blobget_core::humanize::format_bytes_decimal;
use blobget_core::progress::SharedCounter;
use blobget_core::storage::{temp_path, FileSink};
use blobget_core::store::HttpBlobStore;
use blobget_core::{DownloadJob, DownloadSummary, Downloader, ObjectRef};
use std::path::PathBuf;
use std::sync::Arc;

use super::progress::TerminalProgress;

/// What to fetch and where to put it.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub bucket: String,
    pub key: String,
    pub output: PathBuf,
    pub quiet: bool,
}

pub fn run_download(
    req: &DownloadRequest,
    headers: &[(String, String)],
    cfg: &BlobgetConfig,
) -> Result<()> {
    let mut options = cfg.http_options();
    options.headers = headers.to_vec();
    let store = HttpBlobStore::new(&cfg.endpoint, options)?;
    let downloader = Downloader::new(Arc::new(store)).with_retry_policy(cfg.retry_policy());
    download_with(&downloader, req, cfg)?;
    Ok(())
}

/// Resolve the size first so a missing object never leaves a file behind,
/// then download into the `.part` file (or the output itself when
/// `atomic_output` is off) and rename on success.
pub(super) fn download_with(
    downloader: &Downloader,
    req: &DownloadRequest,
    cfg: &BlobgetConfig,
) -> Result<DownloadSummary> {
    let object = ObjectRef::new(req.bucket.as_str(), req.key.as_str());
    let size = downloader
        .resolve(&object)
        .context("couldn't get object size")?;

    let start_msg = format!(
        "Starting download of s3://{}/{}, size: {}",
        object.bucket,
        object.normalized_key(),
        format_bytes_decimal(size)
    );
    tracing::info!("{}", start_msg);
    if !req.quiet {
        eprintln!("{}", start_msg);
    }

    let job = DownloadJob::new(object, size, cfg.part_size, cfg.concurrency)?;

    let write_path = if cfg.atomic_output {
        temp_path(&req.output)
    } else {
        req.output.clone()
    };
    let writer = FileSink::create(&write_path, size)?;

    let result = if req.quiet {
        downloader.run(&job, &writer, &SharedCounter::new())
    } else {
        downloader.run_observed(
            &job,
            &writer,
            cfg.progress_interval(),
            Box::new(TerminalProgress::stdout()),
        )
    };
    let summary = result.with_context(|| {
        format!(
            "failed to download {}; partial data left in {}",
            job.object(),
            write_path.display()
        )
    })?;

    writer.sync()?;
    if cfg.atomic_output {
        writer.persist(&req.output)?;
    }

    tracing::info!("File downloaded, {} bytes", summary.bytes_written);
    if !req.quiet {
        eprintln!("File downloaded, {} bytes", summary.bytes_written);
    }
    Ok(summary)
}
