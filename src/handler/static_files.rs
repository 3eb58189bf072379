//! Static file serving module
//!
//! Builds the response for a resolved file: cache validation, byte ranges and
//! the streamed body. Also serves the configured not-found page.

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::router::{response_meta, RequestContext};
use crate::http::cache::{self, Freshness};
use crate::http::range::RangeParseResult;
use crate::http::{self, body, mime, FileHeaders, ResponseBody};
use crate::routing::FileStat;
use hyper::{Response, StatusCode};
use std::path::Path;
use tokio::fs;

/// Serve a resolved regular file
///
/// HEAD answers with the full-file headers and never opens the file; a Range
/// header only applies to GET.
pub async fn serve_file(
    ctx: &RequestContext,
    state: &AppState,
    path: &Path,
    stat: &FileStat,
) -> Result<Response<ResponseBody>, ServeError> {
    let config = &state.config;
    let meta = response_meta(state);

    let etag = cache::generate_etag(stat);
    let last_modified = cache::last_modified(stat);

    if config.cache
        && cache::evaluate(&ctx.conditional, &etag, stat.modified) == Freshness::NotModified
    {
        return Ok(http::build_304_response(
            meta,
            &etag,
            last_modified.as_deref(),
        ));
    }

    let content_type = mime::get_content_type(path);
    let headers = FileHeaders {
        content_type: &content_type,
        etag: &etag,
        last_modified: last_modified.as_deref(),
        size: stat.len,
    };

    if ctx.is_head {
        return Ok(http::build_file_response(meta, headers, None, body::empty()));
    }

    let range = match http::parse_range_header(ctx.range_header.as_deref(), stat.len) {
        RangeParseResult::Valid(range) => Some(range),
        RangeParseResult::NotSatisfiable => {
            return Err(ServeError::RangeUnsatisfiable { size: stat.len });
        }
        RangeParseResult::None => None,
    };

    let (start, len) = range.map_or((0, stat.len), |r| (r.start, r.len()));
    let body = body::file_body(path, start, len, config.chunk_size, config.debug).await?;

    Ok(http::build_file_response(meta, headers, range, body))
}

/// Serve the 404 response, using the configured not-found page when readable
///
/// A missing or unreadable page falls back to the generic response.
pub async fn serve_not_found(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    let meta = response_meta(state);

    if let Some(template) = &state.config.not_found {
        match fs::read(template).await {
            Ok(page) => {
                return http::build_page_response(
                    meta,
                    StatusCode::NOT_FOUND,
                    &mime::get_content_type(template),
                    page,
                    ctx.is_head,
                );
            }
            Err(e) => {
                tracing::warn!(
                    template = %template.display(),
                    error = %e,
                    "not-found page unreadable, using generic response"
                );
            }
        }
    }

    http::build_error_response(meta, StatusCode::NOT_FOUND)
}
