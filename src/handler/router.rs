//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Every request walks the same
//! states: method check, path validation, resolution, cache check and finally
//! exactly one response.

use crate::config::AppState;
use crate::error::ServeError;
use crate::events::{ResponseEvent, ServerEvent};
use crate::handler::static_files;
use crate::http::cache::Conditional;
use crate::http::{self, ResponseBody, ResponseMeta};
use crate::routing::{self, FileStat, PathResolver, ResolvedTarget};
use hyper::header::{HeaderMap, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    /// Percent-decoded URI path
    pub path: String,
    pub received: Instant,
    pub is_head: bool,
    pub conditional: Conditional,
    pub range_header: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let headers = req.headers();
        Self {
            method: req.method().clone(),
            path: routing::decode_request_path(req.uri().path()),
            received: Instant::now(),
            is_head: req.method() == Method::HEAD,
            conditional: Conditional {
                if_none_match: header_string(headers, IF_NONE_MATCH),
                if_modified_since: header_string(headers, IF_MODIFIED_SINCE),
            },
            range_header: header_string(headers, RANGE),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.received.elapsed()
    }
}

/// A value that is not visible ASCII is kept lossily, so the header still
/// counts as present
fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Response plus what the event stream reports about it
struct Outcome {
    response: Response<ResponseBody>,
    file: Option<PathBuf>,
    stat: Option<FileStat>,
    error: Option<ServeError>,
}

impl Outcome {
    fn new(response: Response<ResponseBody>) -> Self {
        Self {
            response,
            file: None,
            stat: None,
            error: None,
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Request bodies are never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let ctx = RequestContext::from_request(&req);
    drop(req);

    state.events.on_event(&ServerEvent::Request {
        method: ctx.method.clone(),
        path: ctx.path.clone(),
    });

    let outcome = dispatch(&ctx, &state).await;

    if let Some(error) = &outcome.error {
        report_error(&ctx, &state, error);
    }

    state.events.on_event(&ServerEvent::Response(ResponseEvent {
        method: ctx.method.clone(),
        path: ctx.path.clone(),
        status: outcome.response.status(),
        elapsed: ctx.elapsed(),
        error: outcome.error.as_ref().map(ToString::to_string),
        file: outcome.file,
        stat: outcome.stat,
    }));

    Ok(outcome.response)
}

/// Run the request through method check, path validation and resolution
async fn dispatch(ctx: &RequestContext, state: &AppState) -> Outcome {
    let config = &state.config;
    let meta = response_meta(state);

    // 1. Method gate
    if let Err(e) = check_http_method(&ctx.method) {
        return error_outcome(meta, e);
    }

    // 2. Root containment
    let path = match routing::resolve_under_root(&config.root, &ctx.path) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(path = %ctx.path, "path traversal attempt blocked");
            return error_outcome(meta, e);
        }
    };

    // 3. Resolution
    let resolver = PathResolver::new(config, state.events.as_ref());
    match resolver.resolve(&path).await {
        ResolvedTarget::File { path, stat } => {
            let result = static_files::serve_file(ctx, state, &path, &stat).await;
            let mut outcome = match result {
                Ok(response) => Outcome::new(response),
                Err(e) => error_outcome(meta, e),
            };
            outcome.file = Some(path);
            outcome.stat = Some(stat);
            outcome
        }
        ResolvedTarget::Directory { path } => {
            error_outcome(meta, ServeError::DirectoryDenied(path))
        }
        ResolvedTarget::NotFound { cause } => Outcome {
            response: static_files::serve_not_found(ctx, state).await,
            file: None,
            stat: None,
            error: Some(cause),
        },
    }
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Result<(), ServeError> {
    match *method {
        Method::GET | Method::HEAD => Ok(()),
        _ => Err(ServeError::InvalidMethod(method.to_string())),
    }
}

/// Operational headers for this server
pub fn response_meta(state: &AppState) -> ResponseMeta<'_> {
    ResponseMeta {
        server_name: &state.config.server_name,
        cors: state.config.cors.as_deref(),
    }
}

/// Map a request outcome to the response the client sees
pub fn error_response(meta: ResponseMeta<'_>, error: &ServeError) -> Response<ResponseBody> {
    match error {
        ServeError::InvalidMethod(_) => http::build_405_response(meta),
        ServeError::RangeUnsatisfiable { size } => http::build_416_response(meta, *size),
        other => http::build_error_response(meta, other.status_code()),
    }
}

fn error_outcome(meta: ResponseMeta<'_>, error: ServeError) -> Outcome {
    Outcome {
        response: error_response(meta, &error),
        file: None,
        stat: None,
        error: Some(error),
    }
}

/// Failure detail goes to the operator only in debug mode; the client only
/// ever sees the status.
fn report_error(ctx: &RequestContext, state: &AppState, error: &ServeError) {
    if !error.is_failure() {
        tracing::debug!(method = %ctx.method, path = %ctx.path, %error, "request refused");
    } else if state.config.debug {
        tracing::error!(method = %ctx.method, path = %ctx.path, error = ?error, "request failed");
    }
}
