// Server module entry
// Binds the listener, runs the accept loop and owns the shutdown handle

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::run_server_loop;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{AppState, ServerConfig};
use crate::error::ServerError;
use crate::events::{EventListener, NoopListener, SharedListener};

/// How long `stop` waits for open connections to finish
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A configured, not yet listening server
pub struct StaticServer {
    config: ServerConfig,
    events: SharedListener,
}

impl StaticServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            events: Arc::new(NoopListener),
        }
    }

    /// Observer receiving every request, symbolic link and response event
    #[must_use]
    pub fn with_listener(self, listener: impl EventListener + 'static) -> Self {
        self.with_shared_listener(Arc::new(listener))
    }

    #[must_use]
    pub fn with_shared_listener(mut self, events: SharedListener) -> Self {
        self.events = events;
        self
    }

    /// Bind the listener and start accepting connections
    ///
    /// Resolves once the socket is bound; a port that cannot be acquired is a
    /// [`ServerError::BindFailure`].
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let addr = self.config.addr;
        let bind_failure = |source| ServerError::BindFailure { addr, source };

        let listener = create_listener(addr).map_err(bind_failure)?;
        let local_addr = listener.local_addr().map_err(bind_failure)?;

        let state = Arc::new(AppState::new(self.config, self.events));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_server_loop(listener, state, shutdown_rx));

        tracing::debug!(%local_addr, "listener bound");
        Ok(RunningServer {
            local_addr,
            shutdown,
            task: Some(task),
        })
    }
}

/// Handle to a listening server
///
/// Dropping the handle also shuts the server down, without waiting.
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RunningServer {
    /// Address actually bound, with the real port when port 0 was requested
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listener and let open connections finish
    ///
    /// Returns once the port is released; connections still open after
    /// [`SHUTDOWN_GRACE`] are left to close on their own.
    pub async fn stop(mut self) {
        self.shutdown.send_replace(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "server loop ended abnormally");
            }
        }

        if tokio::time::timeout(SHUTDOWN_GRACE, self.shutdown.closed())
            .await
            .is_err()
        {
            tracing::warn!(
                "connections still open after {}s, not waiting",
                SHUTDOWN_GRACE.as_secs()
            );
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn loopback_config(dir: &tempfile::TempDir) -> ServerConfig {
        ServerConfig::new(dir.path())
            .unwrap()
            .with_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    }

    #[tokio::test]
    async fn test_start_reports_bound_port() {
        let dir = tempfile::tempdir().unwrap();
        let server = StaticServer::new(loopback_config(&dir)).start().await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_stop_releases_port() {
        let dir = tempfile::tempdir().unwrap();
        let server = StaticServer::new(loopback_config(&dir)).start().await.unwrap();
        let addr = server.local_addr();
        server.stop().await;

        let config = loopback_config(&dir).with_addr(addr);
        let again = StaticServer::new(config).start().await.unwrap();
        assert_eq!(again.local_addr(), addr);
        again.stop().await;
    }

    #[tokio::test]
    async fn test_bind_failure_when_port_taken() {
        let dir = tempfile::tempdir().unwrap();
        let first = StaticServer::new(loopback_config(&dir)).start().await.unwrap();

        let config = loopback_config(&dir).with_addr(first.local_addr());
        let err = StaticServer::new(config).start().await.err().unwrap();
        assert!(err.is_addr_in_use());

        first.stop().await;
    }
}
