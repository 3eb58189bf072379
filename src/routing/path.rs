//! Request path mapping
//!
//! Turns the path component of a request URI into an absolute path under the
//! root directory. Purely lexical: nothing here touches the filesystem.

use crate::error::ServeError;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

/// Percent-decode a URI path; invalid UTF-8 is replaced rather than rejected
pub fn decode_request_path(uri_path: &str) -> String {
    percent_decode_str(uri_path).decode_utf8_lossy().into_owned()
}

/// Map a decoded request path onto `root`.
///
/// `.` segments are dropped and `..` segments pop the previous segment. A `..`
/// that would climb above `root` is a [`ServeError::PathEscape`], whether or
/// not the target exists.
pub fn resolve_under_root(root: &Path, request_path: &str) -> Result<PathBuf, ServeError> {
    if request_path.contains('\0') {
        return Err(ServeError::NotFound(request_path.to_string()));
    }

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if depth == 0 {
                    return Err(ServeError::PathEscape(request_path.to_string()));
                }
                resolved.pop();
                depth -= 1;
            }
            segment => {
                // protect against segments like `c:` or `a\..\b` on Windows
                if !Path::new(segment)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
                {
                    return Err(ServeError::PathEscape(request_path.to_string()));
                }
                resolved.push(segment);
                depth += 1;
            }
        }
    }

    if !is_contained(root, &resolved) {
        return Err(ServeError::PathEscape(request_path.to_string()));
    }
    Ok(resolved)
}

/// Segment-wise containment: `/srv/www` contains `/srv/www/a` but not `/srv/wwwevil`
pub fn is_contained(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/www")
    }

    #[test]
    fn test_plain_paths() {
        assert_eq!(resolve_under_root(&root(), "/").unwrap(), root());
        assert_eq!(
            resolve_under_root(&root(), "/css/site.css").unwrap(),
            PathBuf::from("/srv/www/css/site.css")
        );
        assert_eq!(
            resolve_under_root(&root(), "/a//./b/").unwrap(),
            PathBuf::from("/srv/www/a/b")
        );
    }

    #[test]
    fn test_parent_segments_inside_root() {
        assert_eq!(
            resolve_under_root(&root(), "/a/b/../c").unwrap(),
            PathBuf::from("/srv/www/a/c")
        );
        assert_eq!(resolve_under_root(&root(), "/a/..").unwrap(), root());
    }

    #[test]
    fn test_escape_rejected() {
        for path in ["/../../etc/passwd", "/..", "/a/../../b", "/./../www/x"] {
            assert!(
                matches!(
                    resolve_under_root(&root(), path),
                    Err(ServeError::PathEscape(_))
                ),
                "{path} should escape"
            );
        }
    }

    #[test]
    fn test_encoded_escape_rejected() {
        let decoded = decode_request_path("/%2e%2e/%2E%2E/etc/passwd");
        assert_eq!(decoded, "/../../etc/passwd");
        assert!(matches!(
            resolve_under_root(&root(), &decoded),
            Err(ServeError::PathEscape(_))
        ));

        let decoded = decode_request_path("/a%2F..%2F..%2Fsecret");
        assert!(matches!(
            resolve_under_root(&root(), &decoded),
            Err(ServeError::PathEscape(_))
        ));
    }

    #[test]
    fn test_decode_spaces_and_unicode() {
        assert_eq!(decode_request_path("/my%20file.txt"), "/my file.txt");
        assert_eq!(decode_request_path("/caf%C3%A9.html"), "/café.html");
    }

    #[test]
    fn test_nul_byte_rejected() {
        let decoded = decode_request_path("/index.html%00.png");
        assert!(matches!(
            resolve_under_root(&root(), &decoded),
            Err(ServeError::NotFound(_))
        ));
    }

    #[test]
    fn test_sibling_directory_not_contained() {
        assert!(is_contained(&root(), Path::new("/srv/www/index.html")));
        assert!(is_contained(&root(), Path::new("/srv/www")));
        assert!(!is_contained(&root(), Path::new("/srv/wwwevil/index.html")));
        assert!(!is_contained(&root(), Path::new("/srv")));
    }
}
