//! File-system primitives gated behind the path validator.
//!
//! Every wrapper validates before it touches the target; nothing here is
//! atomic across the check and the operation that follows it.

use crate::{
    errors::{PathError, PathResult},
    validator::{check_literal, check_path},
};
use std::{
    fs::{self, File, Metadata, OpenOptions},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    ReadWrite,
    ReadWriteTruncate,
    ReadAppend,
}

impl OpenMode {
    /// Whether the mode can create or change the file.
    pub fn writes(&self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    fn options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            OpenMode::Read => opts.read(true),
            OpenMode::Write => opts.write(true).create(true).truncate(true),
            OpenMode::Append => opts.append(true).create(true),
            OpenMode::ReadWrite => opts.read(true).write(true),
            OpenMode::ReadWriteTruncate => opts.read(true).write(true).create(true).truncate(true),
            OpenMode::ReadAppend => opts.read(true).append(true).create(true),
        };
        opts
    }
}

impl FromStr for OpenMode {
    type Err = PathError;

    /// Parses `r`, `w`, `a`, `r+`, `w+`, `a+`; `b` and `t` are accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core: String = s.chars().filter(|c| *c != 'b' && *c != 't').collect();
        match core.as_str() {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            "a" => Ok(OpenMode::Append),
            "r+" => Ok(OpenMode::ReadWrite),
            "w+" => Ok(OpenMode::ReadWriteTruncate),
            "a+" => Ok(OpenMode::ReadAppend),
            _ => Err(PathError::UnsupportedOperation(format!("open mode '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Remove,
    Unlink,
    Chmod { mode: u32 },
    Stat,
    Exists,
    IsFile,
    IsDir,
}

impl FileOp {
    /// Maps an operation name to a [`FileOp`]; `mode` is only used by `chmod`.
    pub fn from_name(name: &str, mode: Option<u32>) -> PathResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "remove" => Ok(FileOp::Remove),
            "unlink" => Ok(FileOp::Unlink),
            "chmod" => mode
                .map(|mode| FileOp::Chmod { mode })
                .ok_or(PathError::MissingArgument("chmod mode")),
            "stat" => Ok(FileOp::Stat),
            "exists" => Ok(FileOp::Exists),
            "isfile" | "is_file" => Ok(FileOp::IsFile),
            "isdir" | "is_dir" => Ok(FileOp::IsDir),
            other => Err(PathError::UnsupportedOperation(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileOp::Remove => "remove",
            FileOp::Unlink => "unlink",
            FileOp::Chmod { .. } => "chmod",
            FileOp::Stat => "stat",
            FileOp::Exists => "exists",
            FileOp::IsFile => "isfile",
            FileOp::IsDir => "isdir",
        }
    }
}

#[derive(Debug)]
pub enum OpOutcome {
    Done,
    Metadata(Metadata),
    Flag(bool),
}

/// Opens `path` after validating it, and its parent for writing modes.
pub fn secure_open<P: AsRef<Path>>(
    path: P,
    mode: OpenMode,
    allowed_base: Option<&Path>,
) -> PathResult<File> {
    let path = path.as_ref();
    let target = gate(path, allowed_base)?;
    if mode.writes() {
        // Reachable when the target resolves somewhere acceptable but its
        // parent does not, e.g. "/dev/.." resolving to "/".
        let parent = parent_of(path);
        if gate(&parent, allowed_base).is_err() {
            warn!(path = %path.display(), parent = %parent.display(), "unsafe parent directory");
            return Err(PathError::PathTraversal(format!(
                "unsafe parent directory: {}",
                parent.display()
            )));
        }
    }
    Ok(mode.options().open(target)?)
}

/// Runs `op` on `path` once it passes validation.
pub fn secure_file_operation<P: AsRef<Path>>(
    op: FileOp,
    path: P,
    allowed_base: Option<&Path>,
) -> PathResult<OpOutcome> {
    let path = path.as_ref();
    let target = gate(path, allowed_base)?;
    let outcome = match op {
        FileOp::Remove | FileOp::Unlink => {
            fs::remove_file(&target)?;
            OpOutcome::Done
        }
        FileOp::Chmod { mode } => {
            set_mode(&target, mode)?;
            OpOutcome::Done
        }
        FileOp::Stat => OpOutcome::Metadata(fs::metadata(&target)?),
        FileOp::Exists => OpOutcome::Flag(target.exists()),
        FileOp::IsFile => OpOutcome::Flag(target.is_file()),
        FileOp::IsDir => OpOutcome::Flag(target.is_dir()),
    };
    Ok(outcome)
}

/// Validates `path` in both its decoded and literal forms and returns the
/// path the I/O should use.
fn gate(path: &Path, allowed_base: Option<&Path>) -> PathResult<PathBuf> {
    if let Err(e) = check_path(path, allowed_base) {
        warn!(path = %path.display(), error = %e, "refused file operation");
        return Err(PathError::PathTraversal(format!("unsafe file path: {}", path.display())));
    }
    let target = target_of(path, allowed_base);
    if let Err(reason) = check_literal(&target, allowed_base) {
        warn!(path = %path.display(), reason = %reason, "literal path escapes");
        return Err(PathError::PathTraversal(format!("unsafe file path: {}", path.display())));
    }
    Ok(target)
}

/// The path the operation acts on: relative paths sit under the base when one
/// is given, matching how they were validated.
fn target_of(path: &Path, allowed_base: Option<&Path>) -> PathBuf {
    match allowed_base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, perms)
}
