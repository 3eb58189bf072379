// Application state module
// Immutable runtime configuration shared by every request task

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};

use super::types::Config;
use super::{DEFAULT_CHUNK_SIZE, DEFAULT_INDEX, DEFAULT_PORT, DEFAULT_SERVER_NAME};
use crate::error::ServerError;
use crate::events::{NoopListener, SharedListener};

/// Runtime configuration of one server instance.
///
/// `root` is canonical: absolute, normalized and free of links, so every
/// resolved path can be checked for containment against it lexically.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub root: PathBuf,
    pub addr: SocketAddr,
    pub follow_symlinks: bool,
    pub index: String,
    pub not_found: Option<PathBuf>,
    pub cors: Option<String>,
    pub server_name: String,
    pub cache: bool,
    pub chunk_size: usize,
    pub debug: bool,
}

impl ServerConfig {
    /// Configuration serving `root` with defaults for everything else
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ServerError> {
        Ok(Self {
            root: canonical_root(root.as_ref())?,
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            follow_symlinks: false,
            index: DEFAULT_INDEX.to_string(),
            not_found: None,
            cors: None,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            cache: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            debug: false,
        })
    }

    /// Build from loaded file/env configuration
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let root = canonical_root(&config.files.root)?;
        let not_found = config
            .files
            .not_found
            .as_ref()
            .map(|template| root.join(template));

        Ok(Self {
            addr: config.get_socket_addr()?,
            follow_symlinks: config.files.follow_symlinks,
            index: checked_index(&config.files.index)?,
            not_found,
            cors: config.files.cors.clone(),
            server_name: config.http.server_name.clone(),
            cache: config.http.cache,
            chunk_size: config.http.chunk_size.max(1),
            debug: config.logging.debug,
            root,
        })
    }

    #[must_use]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// An empty name turns index lookup off
    pub fn with_index(mut self, index: impl Into<String>) -> Result<Self, ServerError> {
        self.index = checked_index(&index.into())?;
        Ok(self)
    }

    /// Relative template paths are taken from the root directory
    #[must_use]
    pub fn with_not_found(mut self, template: impl AsRef<Path>) -> Self {
        self.not_found = Some(self.root.join(template));
        self
    }

    #[must_use]
    pub fn with_cors(mut self, origin: impl Into<String>) -> Self {
        self.cors = Some(origin.into());
        self
    }

    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Resolve the root directory to its canonical form; it must be a directory
fn canonical_root(root: &Path) -> Result<PathBuf, ServerError> {
    let canonical = root.canonicalize().map_err(|source| ServerError::RootPath {
        path: root.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(ServerError::RootPath {
            path: root.to_path_buf(),
            source: std::io::Error::other("not a directory"),
        });
    }
    Ok(canonical)
}

/// The index name is joined onto request paths after containment was
/// checked, so it must stay a plain file name
fn checked_index(index: &str) -> Result<String, ServerError> {
    let mut components = Path::new(index).components();
    match (components.next(), components.next()) {
        (None, _) | (Some(Component::Normal(_)), None) => Ok(index.to_string()),
        _ => Err(ServerError::InvalidIndex(index.to_string())),
    }
}

/// Application state
///
/// Read-only for the lifetime of the server; request tasks share it via `Arc`.
pub struct AppState {
    pub config: ServerConfig,
    pub events: SharedListener,
}

impl AppState {
    pub fn new(config: ServerConfig, events: SharedListener) -> Self {
        Self { config, events }
    }

    /// State whose events go nowhere
    pub fn silent(config: ServerConfig) -> Self {
        Self::new(config, std::sync::Arc::new(NoopListener))
    }
}
