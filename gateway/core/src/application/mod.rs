// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod access_audit_logger;
pub mod registry_service;

pub use access_audit_logger::AccessAuditLogger;
pub use registry_service::RegistryService;
