use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{RetryPolicy, MAX_BACKOFF};
use crate::store::HttpOptions;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per part (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/blobget/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobgetConfig {
    /// Store endpoint; objects are fetched from `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,
    /// Bytes per ranged request.
    pub part_size: u64,
    /// Maximum parts in flight at once.
    pub concurrency: u32,
    /// Progress line refresh interval.
    pub progress_interval_ms: u64,
    pub connect_timeout_secs: u64,
    /// Hard cap on a single part attempt.
    pub attempt_timeout_secs: u64,
    /// Abort an attempt below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Download into `<output>.part` and rename on success.
    pub atomic_output: bool,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for BlobgetConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://s3.amazonaws.com".to_string(),
            part_size: 5 * 1024 * 1024,
            concurrency: 5,
            progress_interval_ms: 1000,
            connect_timeout_secs: 30,
            attempt_timeout_secs: 3600,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            atomic_output: true,
            retry: None,
        }
    }
}

impl BlobgetConfig {
    /// Reject values the downloader cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.part_size == 0 {
            bail!("part_size must be greater than zero");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.progress_interval_ms == 0 {
            bail!("progress_interval_ms must be greater than zero");
        }
        if let Some(retry) = &self.retry {
            if retry.max_attempts == 0 {
                bail!("retry.max_attempts must be at least 1");
            }
            if !retry.base_delay_secs.is_finite() || retry.base_delay_secs < 0.0 {
                bail!("retry.base_delay_secs must be a non-negative number");
            }
            if retry.max_delay_secs > MAX_BACKOFF.as_secs() {
                bail!(
                    "retry.max_delay_secs must be at most {}",
                    MAX_BACKOFF.as_secs()
                );
            }
            if retry.base_delay_secs > retry.max_delay_secs as f64 {
                bail!("retry.base_delay_secs must not exceed retry.max_delay_secs");
            }
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Transfer settings for the HTTP store; extra headers come from the caller.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            low_speed_limit: self.low_speed_limit,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            headers: Vec::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("blobget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BlobgetConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BlobgetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BlobgetConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
