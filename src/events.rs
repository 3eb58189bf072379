//! Structured server events
//!
//! The core reports what it does through [`ServerEvent`] values handed to an
//! [`EventListener`]. Formatting them for humans is the listener's business.

use crate::routing::FileStat;
use hyper::{Method, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Event emitted by the request pipeline
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A request was received
    Request { method: Method, path: String },
    /// A symbolic link was followed during resolution
    SymbolicLink { link: PathBuf, target: PathBuf },
    /// A response was produced
    Response(ResponseEvent),
}

/// Final outcome of one request
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub elapsed: Duration,
    /// Error detail for the operator, never sent to the client
    pub error: Option<String>,
    /// Resolved file, set for file responses
    pub file: Option<PathBuf>,
    pub stat: Option<FileStat>,
}

impl ResponseEvent {
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }
}

/// Observer of server events.
///
/// Called inline on the request task, so implementations should not block.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ServerEvent);
}

/// Shared handle to a listener
pub type SharedListener = Arc<dyn EventListener>;

/// Listener that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl EventListener for NoopListener {
    fn on_event(&self, _event: &ServerEvent) {}
}

impl<F> EventListener for F
where
    F: Fn(&ServerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ServerEvent) {
        self(event);
    }
}

/// Forwards events to a channel; events are dropped once the receiver is gone
impl EventListener for UnboundedSender<ServerEvent> {
    fn on_event(&self, event: &ServerEvent) {
        let _ = self.send(event.clone());
    }
}
