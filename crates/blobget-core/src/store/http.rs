//! HTTP store client over libcurl.
//!
//! Objects live at `{endpoint}/{bucket}/{key}` (path-style addressing, as
//! S3, R2 and MinIO accept for public or presigned access). Size comes from a
//! HEAD; parts come from GETs with a `Range` header that must be answered
//! with `206 Partial Content` and a matching `Content-Range`.

use std::cell::RefCell;
use std::io;
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use super::parse::{parse_content_length, parse_content_range, parse_http_status};
use super::{BlobStore, StoreError};
use crate::job::ObjectRef;
use crate::planner::ByteRange;

const HEAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request transfer settings.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Hard cap on one request (one attempt of one part).
    pub attempt_timeout: Duration,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Extra request headers (e.g. `Authorization`), sent verbatim.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(3600),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            headers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    endpoint: Url,
    options: HttpOptions,
}

impl HttpBlobStore {
    /// `endpoint` must be an absolute `http` or `https` URL.
    pub fn new(endpoint: &str, options: HttpOptions) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid endpoint URL: {}", endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("endpoint must be http or https, got {}", endpoint.scheme());
        }
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("endpoint cannot carry a path: {}", endpoint);
        }
        Ok(Self { endpoint, options })
    }

    /// Full URL of `object`; key segments are percent-encoded individually.
    pub fn object_url(&self, object: &ObjectRef) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Other(format!("bad endpoint: {}", self.endpoint)))?;
            segments.pop_if_empty();
            segments.push(&object.bucket);
            segments.extend(object.normalized_key().split('/'));
        }
        Ok(url)
    }

    fn easy_for(&self, url: &Url) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(self.options.low_speed_limit)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        easy.timeout(self.options.attempt_timeout)?;
        if !self.options.headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in &self.options.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

/// Record a header line; a new status line (after a redirect) starts a fresh set.
fn push_header(headers: &mut Vec<String>, data: &[u8]) {
    if let Ok(s) = str::from_utf8(data) {
        let line = s.trim_end();
        if line.starts_with("HTTP/") {
            headers.clear();
        }
        if !line.is_empty() {
            headers.push(line.to_string());
        }
    }
}

/// Status to error for a ranged GET: anything but 206 is a failure, and a
/// 2xx other than 206 means the server ignored the range.
fn range_status_error(code: u32) -> StoreError {
    match code {
        200..=299 => StoreError::Protocol(format!(
            "expected 206 Partial Content, got HTTP {}",
            code
        )),
        _ => StoreError::from_status(code),
    }
}

/// Validate a ranged response before any body byte reaches the sink.
fn check_range_response(headers: &[String], range: ByteRange) -> Result<(), StoreError> {
    let code = parse_http_status(headers).unwrap_or(0);
    if code != 206 {
        return Err(range_status_error(code));
    }
    match parse_content_range(headers) {
        Some((start, end)) if Some(end) == range.last_byte() && start == range.start => Ok(()),
        Some((start, end)) => Err(StoreError::Protocol(format!(
            "Content-Range bytes {}-{} does not match requested {}",
            start,
            end,
            range.range_header_value()
        ))),
        None => Err(StoreError::Protocol(
            "206 response without Content-Range".to_string(),
        )),
    }
}

impl BlobStore for HttpBlobStore {
    fn object_size(&self, object: &ObjectRef) -> Result<u64, StoreError> {
        let url = self.object_url(object)?;
        let mut headers: Vec<String> = Vec::new();

        let mut easy = self.easy_for(&url).map_err(StoreError::from_curl)?;
        easy.nobody(true).map_err(StoreError::from_curl)?;
        // Metadata queries should be quick even when transfers are allowed to run long.
        easy.timeout(HEAD_TIMEOUT.min(self.options.attempt_timeout))
            .map_err(StoreError::from_curl)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    push_header(&mut headers, data);
                    true
                })
                .map_err(StoreError::from_curl)?;
            transfer.perform().map_err(StoreError::from_curl)?;
        }

        let code = easy.response_code().map_err(StoreError::from_curl)?;
        if !(200..300).contains(&code) {
            return Err(StoreError::from_status(code));
        }
        let size = parse_content_length(&headers)
            .ok_or_else(|| StoreError::Protocol("HEAD response without Content-Length".to_string()))?;
        tracing::debug!(%url, size, "resolved object size");
        Ok(size)
    }

    fn read_range(
        &self,
        object: &ObjectRef,
        range: ByteRange,
        abort: &AtomicBool,
        on_chunk: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<(), StoreError> {
        let url = self.object_url(object)?;
        let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut rejected: Option<StoreError> = None;
        let mut sink_error: Option<io::Error> = None;
        let mut validated = false;

        let mut easy = self.easy_for(&url).map_err(StoreError::from_curl)?;
        easy.range(&range.curl_range()).map_err(StoreError::from_curl)?;
        // The progress callback also runs while the peer is silent, so an
        // abort reaches transfers that never call the write callback again.
        easy.progress(true).map_err(StoreError::from_curl)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    push_header(&mut headers.borrow_mut(), data);
                    true
                })
                .map_err(StoreError::from_curl)?;
            transfer
                .write_function(|data| {
                    if !validated {
                        if let Err(e) = check_range_response(&headers.borrow(), range) {
                            rejected = Some(e);
                            return Ok(0);
                        }
                        validated = true;
                    }
                    match on_chunk(data) {
                        Ok(()) => Ok(data.len()),
                        Err(e) => {
                            sink_error = Some(e);
                            Ok(0)
                        }
                    }
                })
                .map_err(StoreError::from_curl)?;
            transfer
                .progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed))
                .map_err(StoreError::from_curl)?;
            transfer.perform()
        };

        if let Some(e) = rejected {
            return Err(e);
        }
        if abort.load(Ordering::Relaxed) && performed.is_err() {
            return Err(StoreError::Aborted);
        }
        if let Some(e) = sink_error {
            return Err(StoreError::Sink(e));
        }
        performed.map_err(StoreError::from_curl)?;

        // Bodies that never reached the write callback (empty error pages).
        let code = easy.response_code().map_err(StoreError::from_curl)?;
        if code != 206 {
            return Err(range_status_error(code));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: &str) -> HttpBlobStore {
        HttpBlobStore::new(endpoint, HttpOptions::default()).unwrap()
    }

    #[test]
    fn object_url_path_style() {
        let s = store("https://s3.amazonaws.com");
        let url = s.object_url(&ObjectRef::new("my-bucket", "dir/file.bin")).unwrap();
        assert_eq!(url.as_str(), "https://s3.amazonaws.com/my-bucket/dir/file.bin");
    }

    #[test]
    fn object_url_keeps_endpoint_path_and_encodes_key() {
        let s = store("http://127.0.0.1:9000/storage/");
        let url = s
            .object_url(&ObjectRef::new("b", "/a dir/x?y.bin"))
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/storage/b/a%20dir/x%3Fy.bin");
    }

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(HttpBlobStore::new("ftp://example.com", HttpOptions::default()).is_err());
        assert!(HttpBlobStore::new("not a url", HttpOptions::default()).is_err());
    }

    #[test]
    fn push_header_resets_on_new_status_line() {
        let mut h = Vec::new();
        push_header(&mut h, b"HTTP/1.1 302 Found\r\n");
        push_header(&mut h, b"Location: http://other/\r\n");
        assert_eq!(h.len(), 2);
        push_header(&mut h, b"HTTP/1.1 206 Partial Content\r\n");
        push_header(&mut h, b"\r\n");
        assert_eq!(h, vec!["HTTP/1.1 206 Partial Content".to_string()]);
    }

    #[test]
    fn range_response_must_be_206_with_matching_content_range() {
        let range = ByteRange { start: 250, end: 500 };
        let ok = vec![
            "HTTP/1.1 206 Partial Content".to_string(),
            "Content-Range: bytes 250-499/1000".to_string(),
        ];
        assert!(check_range_response(&ok, range).is_ok());

        let full_body = vec!["HTTP/1.1 200 OK".to_string()];
        assert!(matches!(
            check_range_response(&full_body, range),
            Err(StoreError::Protocol(_))
        ));

        let shifted = vec![
            "HTTP/1.1 206 Partial Content".to_string(),
            "Content-Range: bytes 0-249/1000".to_string(),
        ];
        assert!(matches!(
            check_range_response(&shifted, range),
            Err(StoreError::Protocol(_))
        ));

        let missing = vec!["HTTP/1.1 404 Not Found".to_string()];
        assert!(matches!(
            check_range_response(&missing, range),
            Err(StoreError::NotFound)
        ));
    }
}
