use crate::{
    errors::{PathError, PathResult},
    sanitize::sanitize_filename,
    validator::{inspect, resolve, Confinement},
};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Joins untrusted `components` onto `base`, one sanitized segment each.
///
/// Every component is screened first (resolved from the base, with no
/// containment or sensitive-root restriction yet) and refused with
/// [`PathError::PathTraversal`] naming it.
/// The joined path is resolved again and must stay under the resolved base,
/// which catches symlinks inside the base that lead out of it.
pub fn secure_join<B, S>(base: B, components: &[S]) -> PathResult<PathBuf>
where
    B: AsRef<Path>,
    S: AsRef<str>,
{
    let base = base.as_ref();
    let base_path = resolve(base).map_err(|e| {
        PathError::PathTraversal(format!("cannot resolve base {}: {e}", base.display()))
    })?;

    let mut joined = base_path.clone();
    for component in components {
        let component = component.as_ref();
        if let Err(reason) = inspect(component, Some(&base_path), Confinement::Unrestricted) {
            warn!(component = %component, reason = %reason, "unsafe join component");
            return Err(PathError::PathTraversal(format!("unsafe path component: {component}")));
        }
        joined.push(sanitize_filename(component)?);
    }

    let resolved = resolve(&joined).map_err(|e| {
        PathError::PathTraversal(format!("cannot resolve {}: {e}", joined.display()))
    })?;
    if !resolved.starts_with(&base_path) {
        warn!(joined = %joined.display(), resolved = %resolved.display(), "join escaped base");
        return Err(PathError::PathTraversal(format!(
            "path traversal detected: {}",
            joined.display()
        )));
    }
    Ok(resolved)
}
