// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Value Objects
// ============================================================================

/// Normalize a URL prefix or request path.
///
/// Strips every leading `/`, then at most one trailing `/`. Both volume
/// prefixes and incoming request paths go through this so they compare
/// on equal footing.
pub fn normalize_url_path(path: &str) -> &str {
    let path = path.trim_start_matches('/');
    path.strip_suffix('/').unwrap_or(path)
}

/// Volume errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Volume URL prefix cannot be empty (volume '{0}')")]
    EmptyPrefix(String),

    #[error("Volume root must be an absolute path (volume '{0}')")]
    RelativeRoot(String),

    #[error("Volume root is not an existing directory (volume '{0}')")]
    RootNotFound(String),

    #[error("Permission identifier cannot be blank (volume '{0}')")]
    BlankPermissionId(String),
}

// ============================================================================
// Volume Entity
// ============================================================================

/// A named filesystem root published under a URL prefix.
///
/// Volumes are immutable once constructed. The registry replaces them as a
/// whole on reload; nothing mutates a volume in place. Every instance,
/// including deserialized ones, goes through [`Volume::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VolumeRecord")]
pub struct Volume {
    /// Human-readable handle, used for logs and audit events only
    name: String,

    /// Public URL prefix, stored normalized (no leading/trailing slash)
    pub(crate) url_prefix: String,

    /// Absolute filesystem directory holding the volume's files
    root_path: PathBuf,

    /// Stable permission identifier (e.g. a UID)
    #[serde(skip_serializing_if = "Option::is_none")]
    permission_id: Option<String>,

    /// Older identifier kept for configurations that predate the UID scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) legacy_permission_id: Option<String>,
}

/// Unchecked wire form of a [`Volume`]
#[derive(Deserialize)]
struct VolumeRecord {
    name: String,
    url_prefix: String,
    root_path: PathBuf,
    #[serde(default)]
    permission_id: Option<String>,
    #[serde(default)]
    legacy_permission_id: Option<String>,
}

impl TryFrom<VolumeRecord> for Volume {
    type Error = VolumeError;

    fn try_from(record: VolumeRecord) -> Result<Self, Self::Error> {
        let mut volume = Volume::new(record.name, &record.url_prefix, record.root_path)?;
        if let Some(id) = record.permission_id {
            volume = volume.with_permission_id(id)?;
        }
        if let Some(id) = record.legacy_permission_id {
            volume = volume.with_legacy_permission_id(id)?;
        }
        Ok(volume)
    }
}

impl Volume {
    /// Create a volume with no permission identifiers.
    ///
    /// The prefix is normalized; an empty prefix or a relative root is rejected.
    pub fn new(
        name: impl Into<String>,
        url_prefix: &str,
        root_path: impl Into<PathBuf>,
    ) -> Result<Self, VolumeError> {
        let name = name.into();
        let url_prefix = normalize_url_path(url_prefix);
        if url_prefix.is_empty() {
            return Err(VolumeError::EmptyPrefix(name));
        }

        let root_path = root_path.into();
        if !root_path.is_absolute() {
            return Err(VolumeError::RelativeRoot(name));
        }

        Ok(Self {
            url_prefix: url_prefix.to_string(),
            name,
            root_path,
            permission_id: None,
            legacy_permission_id: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn permission_id(&self) -> Option<&str> {
        self.permission_id.as_deref()
    }

    pub fn legacy_permission_id(&self) -> Option<&str> {
        self.legacy_permission_id.as_deref()
    }

    /// Attach the primary permission identifier
    pub fn with_permission_id(mut self, id: impl Into<String>) -> Result<Self, VolumeError> {
        self.permission_id = Some(self.checked_id(id.into())?);
        Ok(self)
    }

    /// Attach the legacy permission identifier
    pub fn with_legacy_permission_id(mut self, id: impl Into<String>) -> Result<Self, VolumeError> {
        self.legacy_permission_id = Some(self.checked_id(id.into())?);
        Ok(self)
    }

    fn checked_id(&self, id: String) -> Result<String, VolumeError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(VolumeError::BlankPermissionId(self.name.clone()));
        }
        Ok(trimmed.to_string())
    }

    /// Return the part of a normalized request path after `url_prefix + "/"`.
    ///
    /// `None` when the path does not fall under this volume.
    pub fn strip_prefix<'a>(&self, normalized_path: &'a str) -> Option<&'a str> {
        normalized_path
            .strip_prefix(self.url_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Check that the root exists on disk and is a directory
    pub fn ensure_root_exists(&self) -> Result<(), VolumeError> {
        if self.root_path.is_dir() {
            Ok(())
        } else {
            Err(VolumeError::RootNotFound(self.name.clone()))
        }
    }
}
