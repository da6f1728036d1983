// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Volume Registry
//!
//! Ordered, read-mostly lookup table of configured volumes. Readers take an
//! `Arc` snapshot; `load` swaps in a complete new snapshot, so a reader sees
//! either the old set or the new set and never a mix.
//!
//! Matching is first-match-wins in insertion order, not longest-prefix.

use crate::domain::volume::Volume;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Registry load errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate volume URL prefix: {0}")]
    DuplicatePrefix(String),
}

/// Immutable-snapshot registry of volumes
pub struct VolumeRegistry {
    volumes: RwLock<Arc<[Volume]>>,
}

impl VolumeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            volumes: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Create a registry pre-loaded with `volumes`
    pub fn with_volumes(volumes: Vec<Volume>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.load(volumes)?;
        Ok(registry)
    }

    /// Replace the whole volume set.
    ///
    /// Validation runs before the swap; on error the previous snapshot is
    /// left untouched.
    pub fn load(&self, volumes: Vec<Volume>) -> Result<(), RegistryError> {
        let mut seen = HashSet::with_capacity(volumes.len());
        for volume in &volumes {
            if !seen.insert(volume.url_prefix()) {
                return Err(RegistryError::DuplicatePrefix(volume.url_prefix().to_string()));
            }
        }

        for (index, earlier) in volumes.iter().enumerate() {
            for later in &volumes[index + 1..] {
                if later.strip_prefix(earlier.url_prefix()).is_some()
                    || earlier.strip_prefix(later.url_prefix()).is_some()
                {
                    tracing::warn!(
                        first = %earlier.url_prefix(),
                        second = %later.url_prefix(),
                        "Overlapping volume prefixes; registration order decides routing"
                    );
                }
            }
        }

        let snapshot: Arc<[Volume]> = Arc::from(volumes);
        *self.volumes.write() = snapshot;
        Ok(())
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<[Volume]> {
        Arc::clone(&self.volumes.read())
    }

    /// Find the first volume whose prefix owns `normalized_path`.
    ///
    /// The path must already be normalized (see [`normalize_url_path`]).
    ///
    /// [`normalize_url_path`]: crate::domain::volume::normalize_url_path
    pub fn find_by_prefix(&self, normalized_path: &str) -> Option<Volume> {
        self.snapshot()
            .iter()
            .find(|volume| volume.strip_prefix(normalized_path).is_some())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.volumes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VolumeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(name: &str, prefix: &str) -> Volume {
        Volume::new(name, prefix, format!("/data/{}", name)).unwrap()
    }

    #[test]
    fn test_find_by_prefix() {
        let registry = VolumeRegistry::with_volumes(vec![
            volume("assets", "assets"),
            volume("docs", "/docs/"),
        ])
        .unwrap();

        assert_eq!(registry.find_by_prefix("docs/a.pdf").unwrap().name(), "docs");
        assert_eq!(registry.find_by_prefix("assets/a.png").unwrap().name(), "assets");
        assert!(registry.find_by_prefix("images/a.png").is_none());
        assert!(registry.find_by_prefix("docs").is_none());
    }

    #[test]
    fn test_first_match_wins_over_longer_prefix() {
        let registry = VolumeRegistry::with_volumes(vec![
            volume("public", "assets"),
            volume("private", "assets/private"),
        ])
        .unwrap();

        let matched = registry.find_by_prefix("assets/private/secret.txt").unwrap();
        assert_eq!(matched.name(), "public");
    }

    #[test]
    fn test_duplicate_prefix_keeps_previous_snapshot() {
        let registry = VolumeRegistry::with_volumes(vec![volume("assets", "assets")]).unwrap();

        let result = registry.load(vec![volume("a", "media"), volume("b", "/media/")]);
        assert_eq!(result, Err(RegistryError::DuplicatePrefix("media".to_string())));

        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_prefix("assets/a.png").is_some());
        assert!(registry.find_by_prefix("media/a.png").is_none());
    }

    #[test]
    fn test_reload_replaces_everything() {
        let registry = VolumeRegistry::with_volumes(vec![volume("assets", "assets")]).unwrap();
        let before = registry.snapshot();

        registry.load(vec![volume("docs", "docs")]).unwrap();

        // Old snapshot is still intact for readers that held it
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].name(), "assets");

        assert!(registry.find_by_prefix("assets/a.png").is_none());
        assert_eq!(registry.find_by_prefix("docs/a.pdf").unwrap().name(), "docs");
    }

    #[test]
    fn test_empty_registry() {
        let registry = VolumeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find_by_prefix("assets/a.png").is_none());
    }

    #[test]
    fn test_deserialized_volumes_match_like_constructed_ones() {
        let volumes: Vec<Volume> = serde_json::from_str(
            r#"[{"name":"assets","url_prefix":"/assets/","root_path":"/data/assets"}]"#,
        )
        .unwrap();
        let registry = VolumeRegistry::with_volumes(volumes).unwrap();
        assert_eq!(registry.find_by_prefix("assets/img/a.png").unwrap().name(), "assets");

        let invalid = serde_json::from_str::<Vec<Volume>>(
            r#"[{"name":"bad","url_prefix":"","root_path":"relative/dir"}]"#,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_readers_never_see_partial_reload() {
        let first = vec![volume("a1", "a1"), volume("a2", "a2")];
        let second = vec![volume("b1", "b1"), volume("b2", "b2"), volume("b3", "b3")];
        let registry = VolumeRegistry::with_volumes(first.clone()).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let snapshot = registry.snapshot();
                        let names: Vec<&str> = snapshot.iter().map(Volume::name).collect();
                        assert!(
                            names == ["a1", "a2"] || names == ["b1", "b2", "b3"],
                            "torn snapshot: {:?}",
                            names
                        );
                    }
                });
            }

            for round in 0..200 {
                let next = if round % 2 == 0 { &second } else { &first };
                registry.load(next.clone()).unwrap();
            }
        });
    }
}
