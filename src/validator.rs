use crate::{
    errors::{PathError, PathResult, Rejection},
    patterns,
};
use percent_encoding::percent_decode_str;
use soft_canonicalize::soft_canonicalize;
use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Roots refused when no allowed base is given.
///
/// Matched as plain string prefixes of the resolved path, so `/etcetera` or
/// `/devices` are refused as well. This is a heuristic, not a segment match.
pub const SENSITIVE_ROOTS: &[&str] = &["/etc", "/proc", "/sys", "/dev", "/root"];

/// Returns true when `candidate` passes every check in [`check_path`].
///
/// Never errors: any failure to decide counts as unsafe.
pub fn is_safe_path<P: AsRef<Path>>(candidate: P, allowed_base: Option<&Path>) -> bool {
    check_path(candidate, allowed_base).is_ok()
}

/// Validates `candidate` and returns its resolved form.
///
/// The candidate is percent-decoded, screened against the dangerous pattern
/// list and resolved (symlinks followed, missing trailing components
/// allowed). Relative candidates resolve against `allowed_base` when one is
/// given, otherwise against the working directory. With a base the resolved
/// path must lie under the resolved base; without one it must not fall under
/// [`SENSITIVE_ROOTS`].
pub fn check_path<P: AsRef<Path>>(candidate: P, allowed_base: Option<&Path>) -> PathResult<PathBuf> {
    let candidate = candidate.as_ref();
    let Some(raw) = candidate.to_str() else {
        return Err(reject(&candidate.to_string_lossy(), Rejection::NotUtf8));
    };
    let outcome = match allowed_base {
        Some(base) => match resolve(base) {
            Ok(base) => inspect(raw, Some(&base), Confinement::Within(&base)),
            Err(e) => Err(Rejection::Unresolvable(e.to_string())),
        },
        None => inspect(raw, None, Confinement::AwayFromSensitiveRoots),
    };
    outcome.map_err(|reason| reject(raw, reason))
}

/// Where a resolved candidate is allowed to land.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Confinement<'a> {
    /// Under this already resolved directory.
    Within(&'a Path),
    /// Anywhere not prefixed by [`SENSITIVE_ROOTS`].
    AwayFromSensitiveRoots,
    /// Anywhere; the caller confines the final result itself.
    Unrestricted,
}

/// Runs the checks on `raw`.
///
/// `anchor` is where relative candidates resolve from and is already resolved.
pub(crate) fn inspect(
    raw: &str,
    anchor: Option<&Path>,
    confinement: Confinement<'_>,
) -> Result<PathBuf, Rejection> {
    if raw.is_empty() {
        return Err(Rejection::Empty);
    }
    let decoded = decode(raw);
    if let Some(kind) = patterns::find_danger(&decoded) {
        return Err(Rejection::Pattern(kind));
    }

    let candidate = Path::new(decoded.as_ref());
    let target = match anchor {
        Some(anchor) => anchor.join(candidate),
        None => candidate.to_path_buf(),
    };
    let resolved = resolve(&target).map_err(|e| Rejection::Unresolvable(e.to_string()))?;
    confine(resolved, confinement)
}

/// Resolves `target` exactly as written, without percent-decoding, and
/// confines it the way [`check_path`] would.
///
/// The decoded form can name a different entry than the bytes handed to the
/// OS, so anything about to do I/O on `target` checks both.
pub(crate) fn check_literal(target: &Path, allowed_base: Option<&Path>) -> Result<PathBuf, Rejection> {
    let resolved = resolve(target).map_err(|e| Rejection::Unresolvable(e.to_string()))?;
    match allowed_base {
        Some(base) => {
            let base = resolve(base).map_err(|e| Rejection::Unresolvable(e.to_string()))?;
            confine(resolved, Confinement::Within(&base))
        }
        None => confine(resolved, Confinement::AwayFromSensitiveRoots),
    }
}

fn confine(resolved: PathBuf, confinement: Confinement<'_>) -> Result<PathBuf, Rejection> {
    match confinement {
        Confinement::Within(base) => {
            if !resolved.starts_with(base) {
                return Err(Rejection::OutsideBase { resolved, base: base.to_path_buf() });
            }
        }
        Confinement::AwayFromSensitiveRoots => {
            if resolved.is_absolute() {
                if let Some(root) = sensitive_root(&resolved) {
                    return Err(Rejection::SensitiveRoot(root));
                }
            }
        }
        Confinement::Unrestricted => {}
    }
    Ok(resolved)
}

/// Canonicalizes `path`, tolerating components that do not exist yet.
pub(crate) fn resolve(path: &Path) -> io::Result<PathBuf> {
    let resolved = soft_canonicalize(path)?;
    Ok(dunce::simplified(&resolved).to_path_buf())
}

pub(crate) fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

fn sensitive_root(resolved: &Path) -> Option<&'static str> {
    let s = resolved.to_string_lossy();
    SENSITIVE_ROOTS.iter().copied().find(|root| s.starts_with(root))
}

fn reject(raw: &str, reason: Rejection) -> PathError {
    debug!(path = %raw, reason = %reason, "path rejected");
    PathError::unsafe_path(raw, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::DangerKind;
    use std::fs;

    fn reason(candidate: &str, base: Option<&Path>) -> Rejection {
        match check_path(candidate, base) {
            Err(PathError::UnsafePath { reason, .. }) => reason,
            other => panic!("expected rejection for {candidate:?}, got {other:?}"),
        }
    }

    #[test]
    fn empty_is_unsafe() {
        assert!(!is_safe_path("", None));
        assert_eq!(reason("", None), Rejection::Empty);
    }

    #[test]
    fn traversal_forms_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        for bad in ["../secret", "a/..\\b", "%2e%2e%2fsecret", "%2E%2E%2Fsecret", "x%00y", "a\0b"] {
            assert!(!is_safe_path(bad, None), "{bad:?} should be unsafe");
            assert!(!is_safe_path(bad, Some(tmp.path())), "{bad:?} should be unsafe under base");
        }
    }

    #[test]
    fn decoded_form_is_screened() {
        assert_eq!(reason("%7E%2Fnotes", None), Rejection::Pattern(DangerKind::HomeShortcut));
        assert_eq!(reason("name%3F", None), Rejection::Pattern(DangerKind::IllegalCharacter));
    }

    #[test]
    fn relative_candidate_resolves_under_base() {
        let tmp = tempfile::tempdir().unwrap();
        let base = resolve(tmp.path()).unwrap();
        let resolved = check_path("report.csv", Some(tmp.path())).unwrap();
        assert_eq!(resolved, base.join("report.csv"));
    }

    #[test]
    fn base_itself_is_contained() {
        let tmp = tempfile::tempdir().unwrap();
        let s = tmp.path().to_str().unwrap();
        assert!(is_safe_path(s, Some(tmp.path())));
    }

    #[test]
    fn prefix_sibling_is_outside() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("b");
        let sibling = tmp.path().join("bc");
        fs::create_dir(&base).unwrap();
        fs::create_dir(&sibling).unwrap();
        let candidate = sibling.join("file.txt");
        assert!(matches!(
            reason(candidate.to_str().unwrap(), Some(base.as_path())),
            Rejection::OutsideBase { .. }
        ));
    }

    #[test]
    fn sensitive_roots_rejected_without_base() {
        assert_eq!(reason("/etc", None), Rejection::SensitiveRoot("/etc"));
        assert_eq!(reason("/dev/null", None), Rejection::SensitiveRoot("/dev"));
        assert_eq!(reason("/root", None), Rejection::SensitiveRoot("/root"));
    }

    #[test]
    fn sensitive_prefix_match_is_heuristic() {
        // String-prefix matching also catches unrelated names sharing the prefix.
        assert_eq!(reason("/etcetera-does-not-exist", None), Rejection::SensitiveRoot("/etc"));
    }

    #[test]
    fn absolute_temp_path_is_safe_without_base() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("a.txt");
        fs::write(&f, b"hi").unwrap();
        assert!(is_safe_path(&f, None));
    }

    #[test]
    fn scenario_srv_data_traversal() {
        let base = Path::new("/srv/data");
        assert!(!is_safe_path("/srv/data/../../etc/passwd", Some(base)));
        assert!(is_safe_path("report.csv", Some(base)));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_base_rejected() {
        use std::os::unix::fs::symlink;
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        symlink(outside.path(), root.path().join("link")).unwrap();
        assert!(matches!(
            reason("link/file.txt", Some(root.path())),
            Rejection::OutsideBase { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn literal_check_follows_undecoded_name() {
        use std::os::unix::fs::symlink;
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        symlink(outside.path(), root.path().join("out%41")).unwrap();
        // The decoded name "outA" does not exist and stays inside.
        assert!(is_safe_path("out%41/f.txt", Some(root.path())));
        let literal = root.path().join("out%41/f.txt");
        assert!(matches!(
            check_literal(&literal, Some(root.path())),
            Err(Rejection::OutsideBase { .. })
        ));
    }

    #[test]
    fn unrestricted_inspection_skips_sensitive_roots() {
        let anchor = Path::new("/devices-pathguard-missing");
        assert!(inspect("safe.txt", Some(anchor), Confinement::Unrestricted).is_ok());
        assert_eq!(
            inspect("safe.txt", Some(anchor), Confinement::AwayFromSensitiveRoots),
            Err(Rejection::SensitiveRoot("/dev"))
        );
    }
}
