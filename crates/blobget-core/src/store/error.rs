//! Errors reported by store clients.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    /// Response status the client has no better mapping for.
    #[error("HTTP {0}")]
    Http(u32),

    #[error("timed out: {0}")]
    Timeout(String),

    /// Network-level failure (connect, DNS, reset, truncated transfer).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The store answered, but not in the shape the request asked for.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The caller's abort flag was raised mid-transfer.
    #[error("transfer aborted")]
    Aborted,

    /// The chunk callback refused the data.
    #[error("sink rejected data: {0}")]
    Sink(#[source] io::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Map a response status to the closest error.
    pub fn from_status(code: u32) -> Self {
        match code {
            404 => StoreError::NotFound,
            401 | 403 => StoreError::AccessDenied,
            _ => StoreError::Http(code),
        }
    }

    /// Map a libcurl error: timeouts and network failures keep their class, the rest is `Other`.
    pub fn from_curl(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            return StoreError::Timeout(e.to_string());
        }
        if e.is_couldnt_connect()
            || e.is_couldnt_resolve_host()
            || e.is_couldnt_resolve_proxy()
            || e.is_read_error()
            || e.is_recv_error()
            || e.is_send_error()
            || e.is_got_nothing()
            || e.is_partial_file()
        {
            return StoreError::Connection(e.to_string());
        }
        StoreError::Other(e.to_string())
    }
}
