//! Response header parsing shared by HEAD probes and ranged GETs.

/// Status code from the most recent `HTTP/` status line.
pub(super) fn parse_http_status(lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}

fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        if n.trim().eq_ignore_ascii_case(name) {
            Some(v.trim())
        } else {
            None
        }
    })
}

pub(super) fn parse_content_length(lines: &[String]) -> Option<u64> {
    header_value(lines, "content-length").and_then(|v| v.parse().ok())
}

/// `Content-Range: bytes start-end/total` → `(start, end_inclusive)`.
pub(super) fn parse_content_range(lines: &[String]) -> Option<(u64, u64)> {
    let value = header_value(lines, "content-range")?;
    let spec = value.strip_prefix("bytes")?.trim();
    let (range, _total) = spec.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}
