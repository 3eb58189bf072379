// Configuration module entry point
// Loads layered configuration and builds the immutable runtime view

mod state;
mod types;

use std::net::SocketAddr;

pub use state::{AppState, ServerConfig};
pub use types::{Config, FilesConfig, HttpConfig, ListenConfig, LoggingConfig};

use crate::error::ServerError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9080;
pub const DEFAULT_INDEX: &str = "index.html";
pub const DEFAULT_SERVER_NAME: &str = "static-server";
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Prefix for environment overrides, e.g. `STATIC_SERVER__SERVER__PORT=8080`
const ENV_PREFIX: &str = "STATIC_SERVER";

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("files.root", ".")?
            .set_default("files.index", DEFAULT_INDEX)?
            .set_default("files.follow_symlinks", false)?
            .set_default("http.server_name", DEFAULT_SERVER_NAME)?
            .set_default("http.cache", true)?
            .set_default("http.chunk_size", 65_536)? // 64 KiB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "pretty")?
            .set_default("logging.debug", false)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ServerError::InvalidAddress(addr))
    }
}
