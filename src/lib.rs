//! Path traversal checks, filename sanitizing and joins confined to a base directory.
//!
//! All operations are synchronous and keep no state between calls. Checks
//! read the filesystem to resolve symlinks, so a path judged safe can change
//! before the caller acts on it.

pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod join;
pub mod logging;
pub mod patterns;
pub mod sanitize;
pub mod validator;


pub use errors::{PathError, PathResult, Rejection};
pub use fs_ops::{secure_file_operation, secure_open, FileOp, OpOutcome, OpenMode};
pub use join::secure_join;
pub use patterns::DangerKind;
pub use sanitize::sanitize_filename;
pub use validator::{check_path, is_safe_path};
