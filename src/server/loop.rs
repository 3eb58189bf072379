// Server loop module
// Accepts connections until shutdown is signalled

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::handle_connection;
use crate::config::AppState;

/// Accept loop of one server instance
///
/// Returns once `shutdown` flips or its sender is gone; the listener is dropped
/// on return, which releases the port.
pub async fn run_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        tracing::trace!(peer = %peer_addr, "connection accepted");
                        handle_connection(stream, peer_addr, Arc::clone(&state), shutdown.clone());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to accept connection");
                    }
                }
            }

            _ = shutdown.changed() => break,
        }
    }
}
