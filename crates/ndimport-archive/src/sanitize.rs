use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Character substituted for path separators inside a label.
const SEPARATOR_FILLER: &str = "_";

/// A label reduced to exactly one safe path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SafeSegment(String);

impl SafeSegment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for SafeSegment {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Turn a free-form label (an artist name) into a single directory name.
///
/// Traversal markers are resolved first; anything that still points above or
/// outside the parent is rejected. Remaining separators become `_`.
pub fn sanitize_label(label: &str) -> Result<SafeSegment> {
    let invalid = |reason| Error::InvalidLabel {
        label: label.to_string(),
        reason,
    };

    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(invalid("label is empty"));
    }

    let cleaned = clean(trimmed);
    if is_absolute(&cleaned) || starts_with_parent(&cleaned) {
        return Err(invalid("label contains invalid path characters"));
    }

    let segment = cleaned.replace(['/', '\\'], SEPARATOR_FILLER);
    if segment == "." || segment.is_empty() {
        return Err(invalid("label does not name a directory"));
    }

    Ok(SafeSegment(segment))
}

/// Clean an archive entry name into a path relative to the extraction root.
///
/// Returns `Ok(None)` for names that clean to the root itself (`./`).
pub fn clean_entry_path(name: &str) -> Result<Option<PathBuf>> {
    let cleaned = clean(&name.replace('\\', "/"));
    if cleaned == "." {
        return Ok(None);
    }

    if is_absolute(&cleaned) || has_drive_prefix(&cleaned) || starts_with_parent(&cleaned) {
        return Err(Error::UnsafePath {
            entry: name.to_string(),
            cleaned: PathBuf::from(cleaned),
        });
    }

    Ok(Some(PathBuf::from(cleaned)))
}

/// Lexically normalize a `/`-separated path.
///
/// Repeated separators and `.` segments are dropped, `..` consumes the
/// preceding segment where one exists. Leading `..` survive on relative
/// paths and are discarded on rooted ones. The empty path cleans to `.`.
pub(crate) fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn is_absolute(cleaned: &str) -> bool {
    cleaned.starts_with('/') || Path::new(cleaned).is_absolute()
}

/// Entry names such as `C:/boot.ini` are never relative to the staging root.
fn has_drive_prefix(cleaned: &str) -> bool {
    let first = cleaned.split('/').next().unwrap_or_default();
    first.len() == 2 && first.ends_with(':') && first.as_bytes()[0].is_ascii_alphabetic()
}

fn starts_with_parent(cleaned: &str) -> bool {
    cleaned.split('/').next() == Some("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_resolves_segments() {
        assert_eq!(clean("foo//bar/./baz/../qux"), "foo/bar/qux");
        assert_eq!(clean("a/.."), ".");
        assert_eq!(clean(""), ".");
        assert_eq!(clean("../a/../.."), "../..");
        assert_eq!(clean("/../etc"), "/etc");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("Album/"), "Album");
    }

    #[test]
    fn label_passthrough() {
        assert_eq!(sanitize_label("  Björk ").unwrap().as_str(), "Björk");
        assert_eq!(
            sanitize_label("Guns N' Roses (Live!)").unwrap().as_str(),
            "Guns N' Roses (Live!)"
        );
        #[cfg(unix)]
        {
            assert_eq!(sanitize_label("C:").unwrap().as_str(), "C:");
            assert_eq!(sanitize_label("A:/B").unwrap().as_str(), "A:_B");
        }
    }

    #[test]
    fn label_separators_replaced() {
        assert_eq!(sanitize_label("AC/DC").unwrap().as_str(), "AC_DC");
        assert_eq!(sanitize_label("foo\\bar").unwrap().as_str(), "foo_bar");
        assert_eq!(sanitize_label("a/./b/").unwrap().as_str(), "a_b");
    }

    #[test]
    fn label_traversal_resolved_before_check() {
        assert_eq!(sanitize_label("x/../y").unwrap().as_str(), "y");
        assert!(sanitize_label("x/../../y").is_err());
    }

    #[test]
    fn label_rejected() {
        for label in ["", "   ", ".", "..", "../etc", "/", "/music", "a/..", "./"] {
            assert!(
                matches!(sanitize_label(label), Err(Error::InvalidLabel { .. })),
                "{label:?} should be rejected"
            );
        }
    }

    #[test]
    fn entry_path_relative() {
        let cleaned = clean_entry_path("Album/./01 Intro.mp3").unwrap().unwrap();
        assert_eq!(cleaned, Path::new("Album/01 Intro.mp3"));
        assert_eq!(clean_entry_path("./").unwrap(), None);
        assert_eq!(
            clean_entry_path("Album\\cover.jpg").unwrap().unwrap(),
            Path::new("Album/cover.jpg")
        );
    }

    #[test]
    fn entry_path_zip_slip() {
        for name in ["../evil.sh", "a/../../evil.sh", "/etc/passwd", "..\\evil.dll", "C:/boot.ini"] {
            assert!(
                matches!(clean_entry_path(name), Err(Error::UnsafePath { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn entry_path_inner_traversal_allowed() {
        let cleaned = clean_entry_path("a/b/../c.txt").unwrap().unwrap();
        assert_eq!(cleaned, Path::new("a/c.txt"));
    }

    proptest! {
        #[test]
        fn sanitized_label_has_no_separator(label in ".*[/\\\\].*") {
            if let Ok(segment) = sanitize_label(&label) {
                prop_assert!(!segment.as_str().contains('/'));
                prop_assert!(!segment.as_str().contains('\\'));
            }
        }

        #[test]
        fn absolute_label_rejected(rest in "[a-zA-Z0-9 _./-]{0,24}") {
            let label = format!("/{rest}");
            prop_assert!(sanitize_label(&label).is_err());
        }

        #[test]
        fn cleaned_entry_stays_inside(name in "[a-z./]{1,32}") {
            if let Ok(Some(path)) = clean_entry_path(&name) {
                prop_assert!(path.is_relative());
                prop_assert!(!path.starts_with(".."));
            }
        }
    }
}
