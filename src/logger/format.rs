//! Access log format module
//!
//! Supports multiple log formats:
//! - `pretty` (console lines for request, symbolic link and response events)
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)

use crate::events::ResponseEvent;
use chrono::Local;
use hyper::StatusCode;
use serde::Serialize;
use std::path::{Component, Path};
use std::time::Duration;

/// Selected access log output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLogFormat {
    Pretty,
    Combined,
    Common,
    Json,
}

impl AccessLogFormat {
    /// Parse a configured format name; `None` for unknown names
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "combined" => Some(Self::Combined),
            "common" => Some(Self::Common),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Access log entry built from one response event
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Request timestamp
    #[serde(serialize_with = "serialize_time")]
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, ...)
    pub method: String,
    /// Decoded request path
    pub path: String,
    /// Response status code
    pub status: u16,
    /// Size of the served file, when one was served in full
    pub body_bytes: Option<u64>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
    /// Resolved file, if any
    pub file: Option<String>,
}

fn serialize_time<S>(time: &chrono::DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    /// Create an entry for a response event, stamped with the current time
    pub fn from_event(event: &ResponseEvent) -> Self {
        let body_bytes = if event.status == StatusCode::OK {
            event.stat.as_ref().map(|stat| stat.len)
        } else {
            None
        };

        Self {
            time: Local::now(),
            method: event.method.to_string(),
            path: event.path.clone(),
            status: event.status.as_u16(),
            body_bytes,
            request_time_us: u64::try_from(event.elapsed.as_micros()).unwrap_or(u64::MAX),
            file: event.file.as_ref().map(|f| f.display().to_string()),
        }
    }

    /// Format the log entry; `pretty` has its own line formatting and falls
    /// back to `common` here
    pub fn format(&self, format: AccessLogFormat) -> String {
        match format {
            AccessLogFormat::Combined => self.format_combined(),
            AccessLogFormat::Json => self.format_json(),
            AccessLogFormat::Common | AccessLogFormat::Pretty => self.format_common(),
        }
    }

    fn body_bytes_field(&self) -> String {
        self.body_bytes
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    }

    /// Apache/Nginx Combined Log Format
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    ///
    /// Client address, referer and user agent are not tracked and logged as `-`.
    fn format_combined(&self) -> String {
        format!("{} \"-\" \"-\"", self.format_common())
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "- - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.status,
            self.body_bytes_field(),
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error":"{e}"}}"#))
    }
}

/// `<-- [GET] /path`
pub fn format_request_line(method: &str, path: &str) -> String {
    format!("<-- [{method}] {path}")
}

/// `--- "link" > "target"`, both relative to the root when inside it
pub fn format_symlink_line(root: &Path, link: &Path, target: &Path) -> String {
    format!(
        "--- \"{}\" > \"{}\"",
        relative_display(root, link),
        relative_display(root, target)
    )
}

/// Console line for a response
///
/// - errors: `--> 404 /missing.html (0.231ms)`
/// - files: `--> 200 OK /docs (docs/index.html) 1.21 KB (0.812ms)`, the
///   resolved file only shown when it differs from the request path
/// - other: `--> 304 Not Modified /style.css (0.120ms)`
pub fn format_response_line(root: &Path, event: &ResponseEvent) -> String {
    let elapsed = format_elapsed(event.elapsed);
    let status = event.status.as_u16();
    let reason = event.status.canonical_reason().unwrap_or("");

    if event.is_error() {
        return format!("--> {status} {} ({elapsed})", event.path);
    }

    match (&event.file, &event.stat) {
        (Some(file), Some(stat)) if event.status == StatusCode::OK => {
            let relative = relative_display(root, file);
            let requested = normalize_request_path(&event.path);
            let shown = if relative == requested {
                event.path.clone()
            } else {
                format!("{} ({relative})", event.path)
            };
            format!(
                "--> {status} {reason} {shown} {} ({elapsed})",
                format_size(stat.len)
            )
        }
        _ => format!("--> {status} {reason} {} ({elapsed})", event.path),
    }
}

/// Elapsed time as `1s 12.345ms`, or `0.812ms` below one second
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = f64::from(elapsed.subsec_nanos()) / 1_000_000.0;
    match elapsed.as_secs() {
        0 => format!("{millis:.3}ms"),
        secs => format!("{secs}s {millis:.3}ms"),
    }
}

/// Human readable size with binary multiples, e.g. `512 B`, `1.21 KB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Request path as a root-relative file path, for comparison with the served file
fn normalize_request_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => {
                parts.pop();
            }
            _ => {}
        }
    }
    parts.join(std::path::MAIN_SEPARATOR_STR)
}
