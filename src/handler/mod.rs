//! Request handler module
//!
//! Request dispatch and the response composer for resolved files.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, RequestContext};
