//! Minimal HTTP/1.1 object server that supports HEAD and Range GET for integration tests.
//!
//! Serves objects at `/{bucket}/{key}`. Responds to HEAD with Content-Length;
//! responds to GET with Range with 206 Partial Content and a Content-Range.
//! Unknown paths get 404. One request per connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If true, every request is answered with 403.
    pub forbidden: bool,
    /// Number of initial GETs answered with 503 before serving normally.
    pub throttle_first: usize,
    /// GETs whose range starts at this offset wait this long before answering.
    pub stall: Option<(u64, Duration)>,
    /// GETs whose range starts at this offset get only this many body bytes,
    /// while the headers still claim the full range.
    pub short: Option<(u64, u64)>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            forbidden: false,
            throttle_first: 0,
            stall: None,
            short: None,
        }
    }
}

pub struct RangeServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/".
    pub endpoint: String,
    gets: Arc<AtomicUsize>,
}

impl RangeServer {
    /// GET requests received so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body` at `/{bucket}/{key}`.
/// The server runs until the process exits.
pub fn start(bucket: &str, key: &str, body: Vec<u8>) -> RangeServer {
    start_with_options(bucket, key, body, RangeServerOptions::default())
}

pub fn start_with_options(
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    opts: RangeServerOptions,
) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let mut objects = HashMap::new();
    objects.insert(format!("/{}/{}", bucket, key), body);
    let objects = Arc::new(objects);
    let gets = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &objects, &counter, opts));
        }
    });
    RangeServer {
        endpoint: format!("http://127.0.0.1:{}/", port),
        gets,
    }
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[String], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(
    mut stream: TcpStream,
    objects: &HashMap<String, Vec<u8>>,
    gets: &AtomicUsize,
    opts: RangeServerOptions,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, path, range) = parse_request(request);

    if opts.forbidden {
        respond(&mut stream, "403 Forbidden", &[], b"");
        return;
    }
    let Some(body) = objects.get(path) else {
        respond(&mut stream, "404 Not Found", &[], b"");
        return;
    };
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        // HEAD advertises the full length but sends no body.
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(head.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", &[], b"");
        return;
    }

    let seen = gets.fetch_add(1, Ordering::SeqCst);
    if seen < opts.throttle_first {
        respond(&mut stream, "503 Service Unavailable", &[], b"slow down");
        return;
    }

    match range.filter(|_| opts.support_ranges) {
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start >= total || start > end_incl {
                let cr = format!("Content-Range: bytes */{}", total);
                respond(&mut stream, "416 Range Not Satisfiable", &[cr], b"");
                return;
            }
            if let Some((_, wait)) = opts.stall.filter(|&(at, _)| at == start) {
                thread::sleep(wait);
            }
            let mut slice = &body[start as usize..=end_incl as usize];
            if let Some((_, len)) = opts.short.filter(|&(at, _)| at == start) {
                slice = &slice[..(len as usize).min(slice.len())];
            }
            let cr = format!("Content-Range: bytes {}-{}/{}", start, end_incl, total);
            respond(&mut stream, "206 Partial Content", &[cr], slice);
        }
        None => respond(&mut stream, "200 OK", &[], body),
    }
}

/// Returns (method, path, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, &str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("");
    let path = request_line.next().unwrap_or("");
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = spec.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, path, range)
}
