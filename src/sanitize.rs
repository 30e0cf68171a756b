use crate::errors::{PathError, PathResult};
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_FILENAME_BYTES: usize = 255;

static RE_FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"|?*\\/\x00-\x1f\x7f]"#).expect("valid forbidden regex"));
static RE_DOT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").expect("valid dot regex"));

/// Turns `filename` into a single safe path segment.
///
/// Separators, characters illegal on common filesystems and control
/// characters become `_`, dot runs collapse to one dot and leading or
/// trailing dots and spaces are stripped. Names longer than
/// [`MAX_FILENAME_BYTES`] are cut in the stem so the extension survives.
/// Applying it to its own output changes nothing.
pub fn sanitize_filename(filename: &str) -> PathResult<String> {
    if filename.is_empty() {
        return Err(PathError::EmptyInput);
    }

    let replaced = RE_FORBIDDEN.replace_all(filename, "_");
    let collapsed = RE_DOT_RUN.replace_all(&replaced, ".");
    let trimmed = trim_padding(&collapsed);
    if trimmed.is_empty() {
        return Err(PathError::EmptyAfterSanitization);
    }
    if trimmed.len() <= MAX_FILENAME_BYTES {
        return Ok(trimmed.to_string());
    }
    Ok(truncate_keeping_extension(trimmed))
}

fn trim_padding(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == ' ')
}

fn truncate_keeping_extension(name: &str) -> String {
    let (stem, ext) = split_extension(name);
    // A stem needs room for at least one full character.
    if ext.len() + 4 > MAX_FILENAME_BYTES {
        return trim_padding(floor_char_boundary(name, MAX_FILENAME_BYTES)).to_string();
    }
    let stem = floor_char_boundary(stem, MAX_FILENAME_BYTES - ext.len());
    // The cut can expose a dot or space that would otherwise double up with the extension.
    let stem = stem.trim_end_matches(|c| c == '.' || c == ' ');
    format!("{stem}{ext}")
}

/// Splits at the last dot, ignoring a dot in first position.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn floor_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
