// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AssetGate Core
//!
//! Volume-scoped access control and gated file streaming.
//!
//! # Architecture
//!
//! - **Domain:** volumes, registry, path resolution, permissions, gateway
//! - **Application:** registry reload orchestration, access audit logging
//! - **Infrastructure:** local file streaming, config-backed volume source,
//!   static user directory, event bus
//! - **Presentation:** axum HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
