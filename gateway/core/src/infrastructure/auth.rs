// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Static bearer-token user directory
//!
//! Maps tokens from `spec.auth.users` to [`DirectoryUser`] contexts. Token
//! comparison is constant-time and scans every entry regardless of where
//! the match is.

use crate::domain::gateway_config::AuthConfig;
use crate::domain::permission::UserContext;
use std::collections::HashSet;
use subtle::ConstantTimeEq;

/// An authenticated caller from the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub name: String,
    pub admin: bool,
    pub permissions: HashSet<String>,
}

impl UserContext for DirectoryUser {
    fn is_admin(&self) -> bool {
        self.admin
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.name)
    }
}

struct Entry {
    token: Vec<u8>,
    user: DirectoryUser,
}

/// Token lookup table built once from configuration
#[derive(Default)]
pub struct StaticUserDirectory {
    entries: Vec<Entry>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the auth section, resolving `env:` token references
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let mut directory = Self::new();
        for user in &config.users {
            let token = user.resolve_token()?;
            directory.insert(
                token,
                DirectoryUser {
                    name: user.name.clone(),
                    admin: user.admin,
                    permissions: user.permissions.iter().cloned().collect(),
                },
            );
        }
        Ok(directory)
    }

    pub fn insert(&mut self, token: impl Into<String>, user: DirectoryUser) {
        self.entries.push(Entry {
            token: token.into().into_bytes(),
            user,
        });
    }

    /// Find the user owning `token`
    pub fn lookup(&self, token: &str) -> Option<&DirectoryUser> {
        let candidate = token.as_bytes();
        let mut found = None;
        for entry in &self.entries {
            let matches: bool = entry.token.as_slice().ct_eq(candidate).into();
            if matches && found.is_none() {
                found = Some(&entry.user);
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
