//! Error types
//!
//! `ServeError` covers per-request outcomes, all of which map to a status code.
//! `ServerError` covers configuration and listener lifecycle failures.

use hyper::StatusCode;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a request that did not end in a successful file response.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Method other than GET or HEAD
    #[error("method not allowed: {0}")]
    InvalidMethod(String),

    /// Request path resolves outside the root directory
    #[error("path escapes root directory: {0}")]
    PathEscape(String),

    /// No file or directory at any candidate path
    #[error("file not found: {0}")]
    NotFound(String),

    /// Symbolic link encountered while links are not followed
    #[error("symbolic link not allowed: {}", .0.display())]
    SymlinkDenied(PathBuf),

    /// Symbolic link chain longer than the resolution limit
    #[error("too many levels of symbolic links: {}", .0.display())]
    SymlinkLoop(PathBuf),

    /// Directory without an index file
    #[error("directory listing denied: {}", .0.display())]
    DirectoryDenied(PathBuf),

    /// Range header outside of the file bounds
    #[error("range not satisfiable for size {size}")]
    RangeUnsatisfiable { size: u64 },

    /// I/O failure after the file was resolved
    #[error("failed to read file: {0}")]
    ReadFailure(#[from] io::Error),
}

impl ServeError {
    /// Status code sent to the client for this outcome
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PathEscape(_) | Self::DirectoryDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::SymlinkDenied(_) | Self::SymlinkLoop(_) => {
                StatusCode::NOT_FOUND
            }
            Self::RangeUnsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::ReadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this outcome is an operational failure rather than a policy decision
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ReadFailure(_))
    }
}

/// Failure to configure or run a server instance.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid root directory '{}': {source}", path.display())]
    RootPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid index file name '{0}': must be a single file name")]
    InvalidIndex(String),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    BindFailure {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl ServerError {
    /// Whether the listener could not be bound because the port is taken
    pub fn is_addr_in_use(&self) -> bool {
        matches!(
            self,
            Self::BindFailure { source, .. } if source.kind() == io::ErrorKind::AddrInUse
        )
    }
}
