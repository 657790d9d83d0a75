//! CLI for blobget.

mod download;
mod progress;

use anyhow::Result;
use blobget_core::config::{self, BlobgetConfig, RetryConfig};
use blobget_core::humanize::parse_byte_size;
use clap::Parser;
use std::path::PathBuf;

pub use download::{run_download, DownloadRequest};

/// Download one object from an S3-compatible store with parallel range reads.
#[derive(Debug, Parser)]
#[command(name = "blobget", version)]
#[command(about = "blobget: concurrent ranged download of a single object", long_about = None)]
pub struct Cli {
    /// Bucket holding the object.
    #[arg(long)]
    pub bucket: String,

    /// Object key.
    #[arg(long)]
    pub key: String,

    /// Local file to write.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Store endpoint URL (overrides config).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bytes per ranged request, e.g. 5MiB or 8000000 (overrides config).
    #[arg(long, value_name = "SIZE", value_parser = parse_part_size)]
    pub part_size: Option<u64>,

    /// Parts downloaded at once (overrides config).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<u32>,

    /// Attempts per part including the first (overrides config).
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Extra request header, e.g. "Authorization: Bearer xyz". Repeatable.
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Write straight into the output file instead of `<output>.part` + rename.
    #[arg(long)]
    pub in_place: bool,

    /// No progress line.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn parse_part_size(s: &str) -> Result<u64, String> {
    parse_byte_size(s).map_err(|e| e.to_string())
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {:?}", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_to(&self, cfg: &mut BlobgetConfig) {
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = endpoint.clone();
        }
        if let Some(part_size) = self.part_size {
            cfg.part_size = part_size;
        }
        if let Some(concurrency) = self.concurrency {
            cfg.concurrency = concurrency;
        }
        if let Some(max_attempts) = self.max_attempts {
            cfg.retry.get_or_insert_with(RetryConfig::default).max_attempts = max_attempts;
        }
        if self.in_place {
            cfg.atomic_output = false;
        }
    }

    pub fn request(&self) -> DownloadRequest {
        DownloadRequest {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            output: self.output.clone(),
            quiet: self.quiet,
        }
    }
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_init()?;
    cli.apply_to(&mut cfg);
    cfg.validate()?;
    tracing::debug!("effective config: {:?}", cfg);
    run_download(&cli.request(), &cli.headers, &cfg)
}
