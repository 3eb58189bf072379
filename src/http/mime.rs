//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// Textual types carry a UTF-8 charset.
///
/// # Examples
/// ```
/// use static_server::http::mime::get_content_type;
/// use std::path::Path;
/// assert_eq!(get_content_type(Path::new("index.html")), "text/html; charset=utf-8");
/// assert_eq!(get_content_type(Path::new("logo.png")), "image/png");
/// assert_eq!(get_content_type(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn get_content_type(path: &Path) -> String {
    let Some(mime) = mime_guess::from_path(path).first() else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };

    let textual = mime.type_() == mime_guess::mime::TEXT
        || mime.subtype() == mime_guess::mime::JAVASCRIPT
        || mime.subtype() == mime_guess::mime::JSON;
    if textual && mime.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(name: &str) -> String {
        get_content_type(Path::new(name))
    }

    #[test]
    fn test_common_types() {
        assert_eq!(content_type("test.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("site.css"), "text/css; charset=utf-8");
        assert_eq!(content_type("data.json"), "application/json; charset=utf-8");
        assert_eq!(content_type("test.png"), "image/png");
        assert_eq!(content_type("movie.mp4"), "video/mp4");
        assert_eq!(content_type("doc.pdf"), "application/pdf");
    }

    #[test]
    fn test_case_insensitive_extension() {
        assert_eq!(content_type("PHOTO.JPG"), "image/jpeg");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type("file.xyz123"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type("Makefile"), DEFAULT_CONTENT_TYPE);
    }
}
