//! Classify store errors and part failures into retry policy error kinds.

use super::error::PartError;
use super::policy::ErrorKind;
use crate::store::StoreError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a store error for retry decisions.
pub fn classify_store_error(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Timeout(_) => ErrorKind::Timeout,
        StoreError::Connection(_) => ErrorKind::Connection,
        StoreError::Http(code) => classify_http_status(*code),
        StoreError::NotFound
        | StoreError::AccessDenied
        | StoreError::Protocol(_)
        | StoreError::Sink(_)
        | StoreError::Aborted
        | StoreError::Other(_) => ErrorKind::Other,
    }
}

/// Classify a part failure into an ErrorKind.
pub fn classify(e: &PartError) -> ErrorKind {
    match e {
        PartError::Store(se) => classify_store_error(se),
        PartError::RangeMismatch { .. } | PartError::Storage(_) | PartError::Aborted => {
            ErrorKind::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::Http5xx(502)));
    }

    #[test]
    fn http_4xx_other() {
        assert_eq!(classify_http_status(404), ErrorKind::Other);
        assert_eq!(classify_http_status(403), ErrorKind::Other);
    }

    #[test]
    fn transient_store_errors_are_retryable() {
        let timeout = PartError::Store(StoreError::Timeout("slow".into()));
        let reset = PartError::Store(StoreError::Connection("reset".into()));
        assert!(timeout.is_transient());
        assert!(reset.is_transient());
        assert!(PartError::Store(StoreError::Http(502)).is_transient());
    }

    #[test]
    fn inconsistencies_are_fatal() {
        let mismatch = PartError::RangeMismatch {
            expected: 10,
            received: 7,
        };
        assert_eq!(classify(&mismatch), ErrorKind::Other);
        assert!(!PartError::Store(StoreError::NotFound).is_transient());
        assert!(!PartError::Store(StoreError::Protocol("200".into())).is_transient());
        let disk = PartError::Storage(std::io::Error::new(std::io::ErrorKind::Other, "full"));
        assert!(!disk.is_transient());
        assert!(!PartError::Aborted.is_transient());
    }
}
