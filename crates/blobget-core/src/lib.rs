//! Concurrent ranged downloads of a single object from a blob store.
//!
//! A [`job::DownloadJob`] is planned into parts, fetched by a bounded pool of
//! worker threads through a [`store::BlobStore`] and written at absolute
//! offsets into an [`storage::OutputSink`], while a sampler reports progress.

pub mod config;
pub mod control;
pub mod downloader;
pub mod error;
pub mod humanize;
pub mod job;
pub mod logging;
pub mod planner;
pub mod progress;
pub mod resolver;
pub mod retry;
pub mod storage;
pub mod store;

pub use downloader::{DownloadSummary, Downloader};
pub use error::DownloadError;
pub use job::{DownloadJob, ObjectRef};
