// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Volume Source Implementations
//!
//! - [`ManifestVolumeSource`] re-reads the gateway YAML manifest on every
//!   load, so a reload picks up edits to `spec.volumes`.
//! - [`StaticVolumeSource`] serves a fixed list (embedding, tests).

use crate::domain::gateway_config::GatewayConfigManifest;
use crate::domain::volume::Volume;
use crate::domain::volume_source::{VolumeSource, VolumeSourceError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Volumes from the `spec.volumes` section of a manifest file
pub struct ManifestVolumeSource {
    path: PathBuf,
}

impl ManifestVolumeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VolumeSource for ManifestVolumeSource {
    async fn load_volumes(&self) -> Result<Vec<Volume>, VolumeSourceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            VolumeSourceError::Unavailable(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let manifest = GatewayConfigManifest::from_yaml_str(&content).map_err(|e| {
            VolumeSourceError::Unavailable(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let volumes = manifest.volumes()?;
        for volume in &volumes {
            volume.ensure_root_exists()?;
        }

        tracing::debug!(
            path = %self.path.display(),
            count = volumes.len(),
            "Loaded volumes from manifest"
        );
        Ok(volumes)
    }
}

/// Fixed, in-memory volume list
pub struct StaticVolumeSource {
    volumes: Vec<Volume>,
}

impl StaticVolumeSource {
    pub fn new(volumes: Vec<Volume>) -> Self {
        Self { volumes }
    }
}

#[async_trait]
impl VolumeSource for StaticVolumeSource {
    async fn load_volumes(&self) -> Result<Vec<Volume>, VolumeSourceError> {
        Ok(self.volumes.clone())
    }
}
