//! Static file server
//!
//! Serves a directory tree over HTTP/1.1 with index files, a symbolic link
//! policy, conditional requests (`ETag`, `Last-Modified`) and single byte
//! ranges. Bodies are streamed from disk in bounded chunks.
//!
//! ```no_run
//! use static_server::{ServerConfig, StaticServer};
//!
//! # async fn run() -> Result<(), static_server::ServerError> {
//! let config = ServerConfig::new("./public")?.with_follow_symlinks(true);
//! let server = StaticServer::new(config)
//!     .with_listener(|event: &static_server::ServerEvent| println!("{event:?}"))
//!     .start()
//!     .await?;
//! println!("listening on {}", server.local_addr());
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;

pub use config::{AppState, Config, ServerConfig};
pub use error::{ServeError, ServerError};
pub use events::{EventListener, NoopListener, ResponseEvent, ServerEvent, SharedListener};
pub use server::{RunningServer, StaticServer};
