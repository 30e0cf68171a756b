//! Known attack signatures checked against decoded candidate paths.

use regex::{Regex, RegexBuilder};
use std::{fmt, sync::LazyLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerKind {
    ParentTraversal,
    DotRun,
    HomeShortcut,
    SystemDirectory,
    Backslash,
    NullByte,
    IllegalCharacter,
}

impl DangerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DangerKind::ParentTraversal => "parent directory traversal",
            DangerKind::DotRun => "repeated dots",
            DangerKind::HomeShortcut => "home directory shorthand",
            DangerKind::SystemDirectory => "system directory reference",
            DangerKind::Backslash => "backslash separator",
            DangerKind::NullByte => "null byte",
            DangerKind::IllegalCharacter => "illegal filename character",
        }
    }
}

impl fmt::Display for DangerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RULES: &[(DangerKind, &str)] = &[
    (DangerKind::ParentTraversal, r"\.\./"),
    (DangerKind::DotRun, r"\.\.\."),
    (DangerKind::HomeShortcut, r"~/"),
    (DangerKind::SystemDirectory, r"/etc/"),
    (DangerKind::SystemDirectory, r"/proc/"),
    (DangerKind::SystemDirectory, r"/sys/"),
    (DangerKind::Backslash, r"\\"),
    (DangerKind::NullByte, r"\x00"),
    (DangerKind::IllegalCharacter, r#"[<>:"|?*]"#),
];

// Compiled once; the rule list never changes at runtime.
static COMPILED: LazyLock<Vec<(DangerKind, Regex)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(kind, pattern)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("valid danger pattern");
            (*kind, re)
        })
        .collect()
});

/// Returns the first rule, in list order, that matches `decoded`.
pub fn find_danger(decoded: &str) -> Option<DangerKind> {
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(decoded))
        .map(|(kind, _)| *kind)
}
