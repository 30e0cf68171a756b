use crate::patterns::DangerKind;
use std::{fmt, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("unsafe path '{path}': {reason}")]
    UnsafePath { path: String, reason: Rejection },
    #[error("path traversal: {0}")]
    PathTraversal(String),
    #[error("filename cannot be empty")]
    EmptyInput,
    #[error("filename becomes empty after sanitization")]
    EmptyAfterSanitization,
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PathError {
    pub fn code(&self) -> &'static str {
        match self {
            PathError::UnsafePath { .. } => "UnsafePath",
            PathError::PathTraversal(_) => "PathTraversal",
            PathError::EmptyInput => "EmptyInput",
            PathError::EmptyAfterSanitization => "EmptyAfterSanitization",
            PathError::UnsupportedOperation(_) => "UnsupportedOperation",
            PathError::MissingArgument(_) => "MissingArgument",
            PathError::Io(_) => "Io",
        }
    }

    pub(crate) fn unsafe_path(path: impl Into<String>, reason: Rejection) -> Self {
        PathError::UnsafePath { path: path.into(), reason }
    }
}

pub type PathResult<T> = Result<T, PathError>;

/// Why a candidate was judged unsafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    NotUtf8,
    Pattern(DangerKind),
    Unresolvable(String),
    OutsideBase { resolved: PathBuf, base: PathBuf },
    SensitiveRoot(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => f.write_str("empty path"),
            Rejection::NotUtf8 => f.write_str("path is not valid UTF-8"),
            Rejection::Pattern(kind) => write!(f, "matches dangerous pattern ({kind})"),
            Rejection::Unresolvable(e) => write!(f, "cannot resolve path: {e}"),
            Rejection::OutsideBase { resolved, base } => {
                write!(f, "{} is outside {}", resolved.display(), base.display())
            }
            Rejection::SensitiveRoot(root) => write!(f, "resolves under sensitive root {root}"),
        }
    }
}
