//! Logger module
//!
//! Provides logging for the server, built on `tracing`:
//! - Subscriber setup from the logging configuration
//! - Access logging of server events with multiple formats
//! - Server lifecycle logging

#[cfg(test)]
pub(crate) mod capture;
mod format;
pub mod writer;

pub use format::{
    format_elapsed, format_request_line, format_response_line, format_size,
    format_symlink_line, AccessLogEntry, AccessLogFormat,
};

use crate::config::{LoggingConfig, ServerConfig};
use crate::error::ServerError;
use crate::events::{EventListener, ServerEvent};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Target of access log records
pub const ACCESS_TARGET: &str = "access";

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Should be called
/// once at application startup.
pub fn init(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Logging(format!("invalid log level: {e}")))?;

    let (writer, ansi) = writer::make_writer(config.log_file.as_deref())
        .map_err(|e| ServerError::Logging(format!("cannot open log file: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &ServerConfig) {
    tracing::info!("Serving files at: http://{addr}");
    tracing::info!(root = %config.root.display(), "Root directory");
    tracing::info!(
        index = %config.index,
        follow_symlinks = config.follow_symlinks,
        cache = config.cache,
        "File options"
    );
    if let Some(ref template) = config.not_found {
        tracing::info!(template = %template.display(), "Not-found page");
    }
    if let Some(ref origin) = config.cors {
        tracing::info!(%origin, "CORS enabled");
    }
}

pub fn log_server_stop(addr: &SocketAddr) {
    tracing::info!("Server on {addr} stopped");
}

/// Event listener writing one access log record per event
///
/// The `pretty` format logs requests, followed links and responses; the
/// other formats log one entry per response.
#[derive(Debug, Clone)]
pub struct AccessLogger {
    root: PathBuf,
    format: AccessLogFormat,
}

impl AccessLogger {
    pub fn new(root: impl Into<PathBuf>, format: AccessLogFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    /// Build from configuration; `None` when access logging is off
    pub fn from_config(logging: &LoggingConfig, root: impl Into<PathBuf>) -> Option<Self> {
        if !logging.access_log {
            return None;
        }
        let format = AccessLogFormat::parse(&logging.access_log_format).unwrap_or_else(|| {
            tracing::warn!(
                format = %logging.access_log_format,
                "unknown access log format, using pretty"
            );
            AccessLogFormat::Pretty
        });
        Some(Self::new(root, format))
    }

    /// Text of the record for `event`, if this format logs it
    pub fn render(&self, event: &ServerEvent) -> Option<String> {
        match (event, self.format) {
            (ServerEvent::Request { method, path }, AccessLogFormat::Pretty) => {
                Some(format_request_line(method.as_str(), path))
            }
            (ServerEvent::SymbolicLink { link, target }, AccessLogFormat::Pretty) => {
                Some(format_symlink_line(&self.root, link, target))
            }
            (ServerEvent::Response(response), AccessLogFormat::Pretty) => {
                Some(format_response_line(&self.root, response))
            }
            (ServerEvent::Response(response), format) => {
                Some(AccessLogEntry::from_event(response).format(format))
            }
            _ => None,
        }
    }
}

impl EventListener for AccessLogger {
    fn on_event(&self, event: &ServerEvent) {
        if let Some(line) = self.render(event) {
            tracing::info!(target: ACCESS_TARGET, "{line}");
        }
    }
}
