// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Volume Permission Evaluation
//!
//! Decides whether a [`UserContext`] may view a matched [`Volume`].
//!
//! Precedence, first true wins:
//! 1. admin override
//! 2. `viewvolume:<permission_id>`
//! 3. `viewvolume:<legacy_permission_id>`
//! 4. deny

use crate::domain::volume::Volume;
use serde::{Deserialize, Serialize};

/// Prefix of every volume view permission key
pub const VIEW_VOLUME_PERMISSION_PREFIX: &str = "viewvolume:";

/// Build the permission key for a volume identifier
pub fn permission_key(id: &str) -> String {
    format!("{}{}", VIEW_VOLUME_PERMISSION_PREFIX, id)
}

/// Per-request view of the caller, supplied by the embedding auth system
pub trait UserContext: Send + Sync {
    fn is_admin(&self) -> bool;

    fn is_authenticated(&self) -> bool;

    /// Whether the user holds `permission_key` (e.g. `viewvolume:abc`)
    fn has_permission(&self, permission_key: &str) -> bool;

    /// Stable identity for audit logs, if any
    fn identity(&self) -> Option<&str> {
        None
    }
}

/// Unauthenticated caller with no permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl UserContext for AnonymousUser {
    fn is_admin(&self) -> bool {
        false
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn has_permission(&self, _permission_key: &str) -> bool {
        false
    }
}

/// Which volume identifier produced a permission match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    Primary,
    Legacy,
}

/// Why a decision was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessReason {
    AdminOverride,
    PermissionMatch {
        permission: String,
        source: PermissionSource,
    },
    PermissionDenied,
    VolumeNotFound,
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn grant(reason: AccessReason) -> Self {
        Self { granted: true, reason }
    }

    pub fn denied() -> Self {
        Self {
            granted: false,
            reason: AccessReason::PermissionDenied,
        }
    }

    pub fn volume_not_found() -> Self {
        Self {
            granted: false,
            reason: AccessReason::VolumeNotFound,
        }
    }
}

/// Stateless permission evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, user: &dyn UserContext, volume: &Volume) -> AccessDecision {
        if user.is_admin() {
            return AccessDecision::grant(AccessReason::AdminOverride);
        }

        let candidates = [
            (volume.permission_id(), PermissionSource::Primary),
            (volume.legacy_permission_id(), PermissionSource::Legacy),
        ];

        for (id, source) in candidates {
            let Some(id) = id else { continue };
            let permission = permission_key(id);
            if user.has_permission(&permission) {
                return AccessDecision::grant(AccessReason::PermissionMatch { permission, source });
            }
        }

        AccessDecision::denied()
    }
}
