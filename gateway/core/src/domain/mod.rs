// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Volumes, path resolution, permission evaluation and the gateway entity
//! that ties them together. Nothing here touches the network; file contents
//! are only read through the [`streaming::FileStreamer`] seam.

pub mod asset;
pub mod events;
pub mod gateway;
pub mod gateway_config;
pub mod mime;
pub mod path_resolver;
pub mod path_sanitizer;
pub mod permission;
pub mod registry;
pub mod streaming;
pub mod volume;
pub mod volume_source;
