// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Presentation Layer (`assetgate-core`)
//!
//! HTTP surface that translates requests into [`AssetGateway`] calls. No
//! access decisions are made here; the router only extracts the caller,
//! maps [`AccessError`] to a status code and streams the body.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | `/health` and the gated `/files/{*path}` download |
//!
//! [`AssetGateway`]: crate::domain::gateway::AssetGateway
//! [`AccessError`]: crate::domain::gateway::AccessError

pub mod api;
