// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Resolver
//!
//! Maps a request path onto a registered volume and a safe absolute path
//! inside that volume's root.

use crate::domain::{
    path_sanitizer::{PathSanitizer, PathSanitizerError},
    registry::VolumeRegistry,
    volume::{normalize_url_path, Volume},
};
use std::path::PathBuf;
use thiserror::Error;

/// Resolution failures. Both variants surface externally as "not found".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No volume matches the request path")]
    NotFound,

    #[error("Rejected request path: {0}")]
    InvalidPath(PathSanitizerError),
}

/// A request path mapped onto a volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The matched volume
    pub volume: Volume,
    /// Normalized request path (leading/trailing slash removed)
    pub request_path: String,
    /// Absolute filesystem path inside `volume.root_path`
    pub absolute_path: PathBuf,
}

/// Request path → (volume, absolute path) resolver
pub struct PathResolver {
    sanitizer: PathSanitizer,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::with_sanitizer(PathSanitizer::new())
    }

    pub fn with_sanitizer(sanitizer: PathSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Resolve `request_path` against `registry`.
    ///
    /// 1. Normalize the path.
    /// 2. Take the first volume (registry order) whose `prefix + "/"` starts it.
    /// 3. Sanitize the remainder and join it onto the volume root.
    ///
    /// An empty path, a bare volume prefix, or a remainder that reduces to
    /// the root itself are all `NotFound`: a volume root is not a file.
    pub fn resolve(
        &self,
        request_path: &str,
        registry: &VolumeRegistry,
    ) -> Result<ResolvedPath, ResolveError> {
        let normalized = normalize_url_path(request_path);
        if normalized.is_empty() {
            return Err(ResolveError::NotFound);
        }

        let volume = registry
            .find_by_prefix(normalized)
            .ok_or(ResolveError::NotFound)?;

        let relative = volume.strip_prefix(normalized).ok_or(ResolveError::NotFound)?;

        let absolute_path = match self.sanitizer.resolve_within(relative, volume.root_path()) {
            Ok(path) => path,
            Err(PathSanitizerError::EmptyPath) => return Err(ResolveError::NotFound),
            Err(e) => return Err(ResolveError::InvalidPath(e)),
        };

        Ok(ResolvedPath {
            request_path: normalized.to_string(),
            volume,
            absolute_path,
        })
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> VolumeRegistry {
        VolumeRegistry::with_volumes(vec![
            Volume::new("assets", "/assets/", "/data/assets").unwrap(),
            Volume::new("private", "assets/private", "/data/private").unwrap(),
            Volume::new("docs", "docs", "/data/docs").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_simple() {
        let resolved = PathResolver::new().resolve("assets/img/a.png", &registry()).unwrap();
        assert_eq!(resolved.volume.name(), "assets");
        assert_eq!(resolved.request_path, "assets/img/a.png");
        assert_eq!(resolved.absolute_path, PathBuf::from("/data/assets/img/a.png"));
    }

    #[test]
    fn test_resolve_strips_slashes() {
        let resolved = PathResolver::new().resolve("///docs/report.pdf/", &registry()).unwrap();
        assert_eq!(resolved.volume.name(), "docs");
        assert_eq!(resolved.absolute_path, PathBuf::from("/data/docs/report.pdf"));
    }

    #[test]
    fn test_first_match_wins() {
        let resolved = PathResolver::new()
            .resolve("assets/private/key.pem", &registry())
            .unwrap();
        assert_eq!(resolved.volume.name(), "assets");
        assert_eq!(resolved.absolute_path, PathBuf::from("/data/assets/private/key.pem"));
    }

    #[test]
    fn test_no_match() {
        let resolver = PathResolver::new();
        assert_eq!(resolver.resolve("images/a.png", &registry()), Err(ResolveError::NotFound));
        assert_eq!(resolver.resolve("", &registry()), Err(ResolveError::NotFound));
        assert_eq!(resolver.resolve("/", &registry()), Err(ResolveError::NotFound));
    }

    #[test]
    fn test_bare_prefix_is_not_a_file() {
        let resolver = PathResolver::new();
        assert_eq!(resolver.resolve("assets", &registry()), Err(ResolveError::NotFound));
        assert_eq!(resolver.resolve("/assets/", &registry()), Err(ResolveError::NotFound));
        assert_eq!(resolver.resolve("assets//", &registry()), Err(ResolveError::NotFound));
        assert_eq!(resolver.resolve("assets/img/..", &registry()), Err(ResolveError::NotFound));
    }

    #[test]
    fn test_traversal_rejected() {
        let result = PathResolver::new().resolve("assets/../../etc/passwd", &registry());
        assert!(matches!(
            result,
            Err(ResolveError::InvalidPath(PathSanitizerError::PathTraversal(_)))
        ));
    }
}
