//! HTTP cache validation module
//!
//! Provides `ETag` generation and conditional request handling.

use crate::routing::FileStat;
use std::time::{SystemTime, UNIX_EPOCH};

/// Conditional request headers, as sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditional {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

/// Cache validation verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve the file normally
    Fresh,
    /// Client copy is current, answer 304
    NotModified,
}

/// Generate `ETag` from file identity, size and modification time
///
/// # Returns
/// Quoted `ETag` string, e.g., `"1f2a-400-18c2b3d4e5f"`
pub fn generate_etag(stat: &FileStat) -> String {
    let mtime_ms = stat
        .modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format!("\"{:x}-{:x}-{:x}\"", stat.ino, stat.len, mtime_ms)
}

/// `Last-Modified` header value, if the platform reports a modification time
pub fn last_modified(stat: &FileStat) -> Option<String> {
    stat.modified.map(httpdate::fmt_http_date)
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// # Returns
/// Returns true if matched, false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        // Handle multiple ETags separated by comma
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Check `If-Modified-Since` against the file's modification time
///
/// Compares whole seconds, the resolution of HTTP dates. An unparsable date or
/// a file without modification time never matches.
pub fn check_not_modified_since(
    if_modified_since: Option<&str>,
    modified: Option<SystemTime>,
) -> bool {
    let (Some(since), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Ok(since) = httpdate::parse_http_date(since.trim()) else {
        return false;
    };
    match (
        modified.duration_since(UNIX_EPOCH),
        since.duration_since(UNIX_EPOCH),
    ) {
        (Ok(modified), Ok(since)) => modified.as_secs() <= since.as_secs(),
        _ => false,
    }
}

/// Decide whether a client's cached copy is still valid
///
/// At least one conditional header must be present, and every present header
/// must be satisfied; a missing header never blocks a match on its own.
pub fn evaluate(conditional: &Conditional, etag: &str, modified: Option<SystemTime>) -> Freshness {
    let if_none_match = conditional.if_none_match.as_deref();
    let if_modified_since = conditional.if_modified_since.as_deref();

    if if_none_match.is_none() && if_modified_since.is_none() {
        return Freshness::Fresh;
    }
    if if_none_match.is_some() && !check_etag_match(if_none_match, etag) {
        return Freshness::Fresh;
    }
    if if_modified_since.is_some() && !check_not_modified_since(if_modified_since, modified) {
        return Freshness::Fresh;
    }
    Freshness::NotModified
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stat() -> FileStat {
        FileStat {
            len: 1024,
            modified: Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            ino: 42,
        }
    }

    fn conditional(inm: Option<&str>, ims: Option<&str>) -> Conditional {
        Conditional {
            if_none_match: inm.map(ToString::to_string),
            if_modified_since: ims.map(ToString::to_string),
        }
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(&stat());
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.starts_with("\"2a-400-"));
    }

    #[test]
    fn test_etag_consistency() {
        assert_eq!(generate_etag(&stat()), generate_etag(&stat()));
    }

    #[test]
    fn test_etag_difference() {
        let mut other = stat();
        other.len += 1;
        assert_ne!(generate_etag(&stat()), generate_etag(&other));

        let mut touched = stat();
        touched.modified = Some(UNIX_EPOCH + Duration::from_secs(1_700_000_001));
        assert_ne!(generate_etag(&stat()), generate_etag(&touched));
    }

    #[test]
    fn test_last_modified() {
        assert_eq!(
            last_modified(&stat()).as_deref(),
            Some("Tue, 14 Nov 2023 22:13:20 GMT")
        );
        let mut unknown = stat();
        unknown.modified = None;
        assert!(last_modified(&unknown).is_none());
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_not_modified_since() {
        let modified = stat().modified;
        assert!(check_not_modified_since(
            Some("Tue, 14 Nov 2023 22:13:20 GMT"),
            modified
        ));
        assert!(check_not_modified_since(
            Some("Wed, 15 Nov 2023 00:00:00 GMT"),
            modified
        ));
        assert!(!check_not_modified_since(
            Some("Tue, 14 Nov 2023 22:13:19 GMT"),
            modified
        ));
        assert!(!check_not_modified_since(Some("yesterday"), modified));
        assert!(!check_not_modified_since(None, modified));
    }

    #[test]
    fn test_evaluate_without_conditionals() {
        let etag = generate_etag(&stat());
        assert_eq!(
            evaluate(&Conditional::default(), &etag, stat().modified),
            Freshness::Fresh
        );
    }

    #[test]
    fn test_evaluate_single_header() {
        let etag = generate_etag(&stat());
        let modified = stat().modified;

        assert_eq!(
            evaluate(&conditional(Some(&etag), None), &etag, modified),
            Freshness::NotModified
        );
        assert_eq!(
            evaluate(&conditional(Some("\"stale\""), None), &etag, modified),
            Freshness::Fresh
        );
        assert_eq!(
            evaluate(
                &conditional(None, Some("Tue, 14 Nov 2023 22:13:20 GMT")),
                &etag,
                modified
            ),
            Freshness::NotModified
        );
    }

    #[test]
    fn test_evaluate_requires_every_present_header() {
        let etag = generate_etag(&stat());
        let modified = stat().modified;

        // matching tag, but the file changed after the client's date
        assert_eq!(
            evaluate(
                &conditional(Some(&etag), Some("Mon, 13 Nov 2023 00:00:00 GMT")),
                &etag,
                modified
            ),
            Freshness::Fresh
        );
        // matching tag, invalid date
        assert_eq!(
            evaluate(&conditional(Some(&etag), Some("garbage")), &etag, modified),
            Freshness::Fresh
        );
        assert_eq!(
            evaluate(
                &conditional(Some(&etag), Some("Tue, 14 Nov 2023 22:13:20 GMT")),
                &etag,
                modified
            ),
            Freshness::NotModified
        );
    }
}
