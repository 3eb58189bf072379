//! HTTP response building module
//!
//! Provides builders for the status codes the server sends. Every response
//! carries the operational headers: `X-Powered-By`, `Date` and, when
//! configured, `Access-Control-Allow-Origin`.

use super::body::{self, ResponseBody};
use super::range::RangeRequest;
use hyper::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, DATE, ETAG, LAST_MODIFIED,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use std::time::SystemTime;

/// Methods the server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Headers shared by every response of one server
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta<'a> {
    pub server_name: &'a str,
    pub cors: Option<&'a str>,
}

/// Validators and entity headers of a resolved file
#[derive(Debug, Clone, Copy)]
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
    pub size: u64,
}

fn builder(status: StatusCode, meta: ResponseMeta<'_>) -> Builder {
    let builder = Response::builder()
        .status(status)
        .header("X-Powered-By", meta.server_name)
        .header(DATE, httpdate::fmt_http_date(SystemTime::now()));
    match meta.cors {
        Some(origin) => builder.header(ACCESS_CONTROL_ALLOW_ORIGIN, origin),
        None => builder,
    }
}

/// Build a file response: 200 for the whole file, 206 for a byte range
///
/// `body` is supplied by the caller (empty for HEAD).
pub fn build_file_response(
    meta: ResponseMeta<'_>,
    file: FileHeaders<'_>,
    range: Option<RangeRequest>,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let (status, content_length) = match range {
        Some(range) => (StatusCode::PARTIAL_CONTENT, range.len()),
        None => (StatusCode::OK, file.size),
    };

    let mut builder = builder(status, meta)
        .header(CONTENT_TYPE, file.content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, file.etag);
    if let Some(last_modified) = file.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    if let Some(range) = range {
        builder = builder.header(CONTENT_RANGE, range.content_range(file.size));
    }

    builder
        .body(body)
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Build 304 Not Modified response
///
/// Keeps the validators, drops every entity header.
pub fn build_304_response(
    meta: ResponseMeta<'_>,
    etag: &str,
    last_modified: Option<&str>,
) -> Response<ResponseBody> {
    let mut builder = builder(StatusCode::NOT_MODIFIED, meta).header(ETAG, etag);
    if let Some(last_modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    builder
        .body(body::empty())
        .unwrap_or_else(|e| fallback(StatusCode::NOT_MODIFIED, &e))
}

/// Build 405 Method Not Allowed response, without body
pub fn build_405_response(meta: ResponseMeta<'_>) -> Response<ResponseBody> {
    builder(StatusCode::METHOD_NOT_ALLOWED, meta)
        .header(ALLOW, ALLOWED_METHODS)
        .header(CONTENT_LENGTH, 0)
        .body(body::empty())
        .unwrap_or_else(|e| fallback(StatusCode::METHOD_NOT_ALLOWED, &e))
}

/// Build 416 Range Not Satisfiable response, without body
pub fn build_416_response(meta: ResponseMeta<'_>, file_size: u64) -> Response<ResponseBody> {
    builder(StatusCode::RANGE_NOT_SATISFIABLE, meta)
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .header(CONTENT_LENGTH, 0)
        .body(body::empty())
        .unwrap_or_else(|e| fallback(StatusCode::RANGE_NOT_SATISFIABLE, &e))
}

/// Build a generic error response whose body is the reason phrase
pub fn build_error_response(meta: ResponseMeta<'_>, status: StatusCode) -> Response<ResponseBody> {
    let text = status.canonical_reason().unwrap_or("Error");
    builder(status, meta)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .body(body::full(text))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Build a response from an in-memory page, e.g. a custom 404 page
pub fn build_page_response(
    meta: ResponseMeta<'_>,
    status: StatusCode,
    content_type: &str,
    page: Vec<u8>,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = page.len();
    let body = if is_head {
        body::empty()
    } else {
        body::full(page)
    };

    builder(status, meta)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Bare response used when a header value is rejected by the builder
fn fallback(status: StatusCode, error: &hyper::http::Error) -> Response<ResponseBody> {
    tracing::error!(%status, %error, "failed to build response");
    let mut response = Response::new(body::empty());
    *response.status_mut() = status;
    response
}
