//! HTTP protocol layer module
//!
//! Protocol building blocks, independent of how a request is routed:
//! conditional request validation, byte ranges, content types, bodies and
//! response builders.

pub mod body;
pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::{parse_range_header, RangeParseResult, RangeRequest};
pub use response::{
    build_304_response, build_405_response, build_416_response, build_error_response,
    build_file_response, build_page_response, FileHeaders, ResponseMeta,
};
