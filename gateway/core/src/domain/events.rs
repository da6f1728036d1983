// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Access Audit Events
//!
//! Events published by the gateway and registry service. They stay inside
//! the process (event bus, logs); none of their detail is ever echoed back
//! to the caller that triggered them.

use crate::domain::permission::AccessReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlates every event emitted for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessEvent {
    AccessGranted {
        request_id: RequestId,
        volume: String,
        path: String,
        user: Option<String>,
        reason: AccessReason,
        granted_at: DateTime<Utc>,
    },
    AccessDenied {
        request_id: RequestId,
        volume: String,
        path: String,
        user: Option<String>,
        authenticated: bool,
        reason: AccessReason,
        denied_at: DateTime<Utc>,
    },
    VolumeNotMatched {
        request_id: RequestId,
        path: String,
        reason: AccessReason,
        attempted_at: DateTime<Utc>,
    },
    PathRejected {
        request_id: RequestId,
        volume: String,
        path: String,
        rejected_at: DateTime<Utc>,
    },
    StreamFailed {
        request_id: RequestId,
        volume: String,
        path: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
    RegistryReloaded {
        volume_count: usize,
        reloaded_at: DateTime<Utc>,
    },
    RegistryReloadFailed {
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl AccessEvent {
    /// Short, stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessGranted { .. } => "access_granted",
            Self::AccessDenied { .. } => "access_denied",
            Self::VolumeNotMatched { .. } => "volume_not_matched",
            Self::PathRejected { .. } => "path_rejected",
            Self::StreamFailed { .. } => "stream_failed",
            Self::RegistryReloaded { .. } => "registry_reloaded",
            Self::RegistryReloadFailed { .. } => "registry_reload_failed",
        }
    }
}
