// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod auth;
pub mod event_bus;
pub mod storage;
pub mod volume_source;

pub use auth::{DirectoryUser, StaticUserDirectory};
pub use event_bus::EventBus;
pub use storage::LocalFileStreamer;
pub use volume_source::{ManifestVolumeSource, StaticVolumeSource};
