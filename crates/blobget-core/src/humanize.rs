//! Human-readable size and duration formatting, and size parsing for flags.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSizeError {
    #[error("invalid size format: {0}")]
    InvalidFormat(String),

    #[error("invalid unit: {0}")]
    InvalidUnit(String),

    #[error("size too large: {0}")]
    Overflow(String),
}

/// Decimal SI size with one decimal: `999 B`, `1.0 kB`, `1.5 MB`.
pub fn format_bytes_decimal(bytes: u64) -> String {
    const UNITS: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];
    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut div = 1000u64;
    let mut exp = 0usize;
    let mut n = bytes / 1000;
    while n >= 1000 {
        div *= 1000;
        exp += 1;
        n /= 1000;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, UNITS[exp])
}

/// Whole-second duration in `1h2m3s` form, rounded to the nearest second.
pub fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    if d.subsec_millis() >= 500 {
        secs = secs.saturating_add(1);
    }
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{}s", s),
        (0, _) => format!("{}m{}s", m, s),
        _ => format!("{}h{}m{}s", h, m, s),
    }
}

/// Parses `5242880`, `5MiB`, `5 MB`, `512k`. Decimal units (`kB`, `MB`, ...)
/// step by 1000, binary units (`KiB`, `MiB`, ...) by 1024. Case-insensitive.
pub fn parse_byte_size(input: &str) -> Result<u64, ParseSizeError> {
    let s = input.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    if num.is_empty() {
        return Err(ParseSizeError::InvalidFormat(input.to_string()));
    }
    let value: u64 = num
        .parse()
        .map_err(|_| ParseSizeError::Overflow(input.to_string()))?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1000,
        "m" | "mb" => 1000u64.pow(2),
        "g" | "gb" => 1000u64.pow(3),
        "t" | "tb" => 1000u64.pow(4),
        "ki" | "kib" => 1 << 10,
        "mi" | "mib" => 1 << 20,
        "gi" | "gib" => 1 << 30,
        "ti" | "tib" => 1 << 40,
        other => return Err(ParseSizeError::InvalidUnit(other.to_string())),
    };
    value
        .checked_mul(multiplier)
        .ok_or_else(|| ParseSizeError::Overflow(input.to_string()))
}
