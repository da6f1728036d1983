// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Volume Source Interface
//!
//! Contract for whatever supplies the volume list at startup and on reload
//! (a config file, a database, a CMS). Defined in the domain layer and
//! implemented in `crate::infrastructure::volume_source`.

use crate::domain::volume::{Volume, VolumeError};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeSourceError {
    #[error("Volume source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid volume definition: {0}")]
    Invalid(#[from] VolumeError),
}

/// Provider of the complete, ordered volume set
#[async_trait]
pub trait VolumeSource: Send + Sync {
    /// Load every volume, in the order they should be matched
    async fn load_volumes(&self) -> Result<Vec<Volume>, VolumeSourceError>;
}
