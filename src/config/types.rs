// Configuration types module
// Raw configuration sections as read from file and environment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ListenConfig,
    pub files: FilesConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads, CPU count when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

/// File tree configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilesConfig {
    pub root: PathBuf,
    pub index: String,
    pub follow_symlinks: bool,
    /// Template served with 404 responses, relative to root unless absolute
    #[serde(default)]
    pub not_found: Option<PathBuf>,
    /// Value for `Access-Control-Allow-Origin`
    #[serde(default)]
    pub cors: Option<String>,
}

/// HTTP response configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Answer conditional requests with 304
    pub cache: bool,
    pub chunk_size: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (pretty, combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Log file path (optional, stderr if not set)
    #[serde(default)]
    pub log_file: Option<String>,
    /// Surface error details of failed responses
    #[serde(default)]
    pub debug: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            log_file: None,
            debug: false,
        }
    }
}
