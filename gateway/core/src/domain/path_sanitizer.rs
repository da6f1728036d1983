// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Lexical path resolution and traversal prevention for volume-relative
//! request paths. This is a domain service (not infrastructure) because
//! keeping a request inside its volume root is a core security rule, not a
//! technical concern.
//!
//! # Security Guarantees
//! - `.` segments are dropped, `..` segments pop the previous segment
//! - A `..` that would climb above the volume root is rejected
//! - `\` is treated as a separator, so `..\..\` cannot slip past
//! - NUL bytes and over-long paths are rejected
//! - On Windows, drive-prefixed segments (`C:`) are rejected; elsewhere
//!   `c:notes.txt` is an ordinary file name
//! - The filesystem is never consulted; symlinks inside a root are trusted

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path sanitization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path too long: {0} bytes")]
    PathTooLong(usize),

    #[error("Path resolves to the volume root")]
    EmptyPath,
}

/// Path sanitizer domain service
pub struct PathSanitizer {
    /// Maximum allowed path length (default: 4096)
    max_path_len: usize,
}

impl PathSanitizer {
    /// Create a new path sanitizer with default settings
    pub fn new() -> Self {
        Self { max_path_len: 4096 }
    }

    /// Create a path sanitizer with custom max length
    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    /// Resolve a volume-relative path and join it onto `volume_root`.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - `volume_root` joined with the sanitized relative path
    /// * `Err(PathSanitizerError)` - path is unsafe, invalid, or names the root itself
    ///
    /// # Examples
    /// ```
    /// use assetgate_core::domain::path_sanitizer::PathSanitizer;
    /// use std::path::{Path, PathBuf};
    ///
    /// let sanitizer = PathSanitizer::new();
    /// let root = Path::new("/data/assets");
    ///
    /// let safe = sanitizer.resolve_within("img/./thumbs/../a.png", root).unwrap();
    /// assert_eq!(safe, PathBuf::from("/data/assets/img/a.png"));
    ///
    /// assert!(sanitizer.resolve_within("../../etc/passwd", root).is_err());
    /// ```
    pub fn resolve_within(
        &self,
        relative: &str,
        volume_root: &Path,
    ) -> Result<PathBuf, PathSanitizerError> {
        let segments = self.segments(relative)?;
        if segments.is_empty() {
            return Err(PathSanitizerError::EmptyPath);
        }

        let mut resolved = volume_root.to_path_buf();
        resolved.extend(segments);
        Ok(resolved)
    }

    /// Resolve `.` and `..` segments, returning the remaining normal segments.
    fn segments<'a>(&self, path: &'a str) -> Result<Vec<&'a str>, PathSanitizerError> {
        self.validate(path)?;

        let mut stack: Vec<&str> = Vec::new();
        for segment in path.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        tracing::warn!(
                            path = %path,
                            "Path traversal attempt detected: '..' escapes volume root"
                        );
                        return Err(PathSanitizerError::PathTraversal(path.to_string()));
                    }
                }
                normal => {
                    if has_drive_prefix(normal) {
                        return Err(PathSanitizerError::InvalidPath(path.to_string()));
                    }
                    stack.push(normal);
                }
            }
        }
        Ok(stack)
    }

    /// Validate a path without resolving it (lightweight check)
    pub fn validate(&self, path: &str) -> Result<(), PathSanitizerError> {
        if path.len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(path.len()));
        }

        if path.contains('\0') {
            tracing::warn!("Path contains null byte (potential security issue)");
            return Err(PathSanitizerError::InvalidPath(
                "Path contains null byte".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

// `C:` style segments would make `PathBuf::push` replace the root on Windows.
#[cfg(windows)]
fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(not(windows))]
fn has_drive_prefix(_segment: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        Path::new("/data/assets")
    }

    #[test]
    fn test_simple_path() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("img/a.png", root());
        assert_eq!(result.unwrap(), PathBuf::from("/data/assets/img/a.png"));
    }

    #[test]
    fn test_normalize_current_dir() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("./img/./a.png", root());
        assert_eq!(result.unwrap(), PathBuf::from("/data/assets/img/a.png"));
    }

    #[test]
    fn test_parent_dir_within_root() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("img/thumbs/../a.png", root());
        assert_eq!(result.unwrap(), PathBuf::from("/data/assets/img/a.png"));
    }

    #[test]
    fn test_reject_escape() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("../../etc/passwd", root());
        assert!(matches!(result.unwrap_err(), PathSanitizerError::PathTraversal(_)));
    }

    #[test]
    fn test_reject_late_escape() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("img/../../secret.txt", root());
        assert!(matches!(result.unwrap_err(), PathSanitizerError::PathTraversal(_)));
    }

    #[test]
    fn test_reject_backslash_escape() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("..\\..\\etc\\passwd", root());
        assert!(matches!(result.unwrap_err(), PathSanitizerError::PathTraversal(_)));
    }

    #[test]
    fn test_absolute_looking_path_stays_inside() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("//etc/passwd", root());
        assert_eq!(result.unwrap(), PathBuf::from("/data/assets/etc/passwd"));
    }

    #[cfg(windows)]
    #[test]
    fn test_reject_drive_prefix() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("C:/Windows/win.ini", Path::new("D:\\data"));
        assert!(matches!(result.unwrap_err(), PathSanitizerError::InvalidPath(_)));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_colon_file_names_allowed() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve_within("notes/c:notes.txt", root());
        assert_eq!(result.unwrap(), PathBuf::from("/data/assets/notes/c:notes.txt"));
    }

    #[test]
    fn test_root_itself_is_empty() {
        let sanitizer = PathSanitizer::new();
        assert_eq!(
            sanitizer.resolve_within("img/..", root()).unwrap_err(),
            PathSanitizerError::EmptyPath
        );
        assert_eq!(
            sanitizer.resolve_within("./", root()).unwrap_err(),
            PathSanitizerError::EmptyPath
        );
    }

    #[test]
    fn test_path_too_long() {
        let sanitizer = PathSanitizer::with_max_length(10);
        let result = sanitizer.resolve_within("very/long/path/that/exceeds", root());
        assert!(matches!(result.unwrap_err(), PathSanitizerError::PathTooLong(_)));
    }

    #[test]
    fn test_validate_null_byte() {
        let sanitizer = PathSanitizer::new();
        assert!(sanitizer.validate("img/a.png").is_ok());
        assert!(sanitizer.validate("img\0/a.png").is_err());
    }
}
