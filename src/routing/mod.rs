//! Routing module
//!
//! Maps request paths onto the served directory tree:
//! - URI decoding and lexical containment under the root directory
//! - Candidate resolution with index file fallback
//! - Symbolic link policy

mod path;
mod resolver;

pub use path::{decode_request_path, is_contained, resolve_under_root};
pub use resolver::{FileStat, PathResolver, ResolvedTarget, MAX_SYMLINK_DEPTH};
