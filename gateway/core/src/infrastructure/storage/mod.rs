// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the `FileStreamer` trait.

pub mod local;

pub use local::LocalFileStreamer;
