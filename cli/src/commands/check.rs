// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `assetgate check`: run the gateway decision for one path, offline
//!
//! Uses the same volumes and users as `serve`, but never opens the file.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use assetgate_core::{
    domain::{
        gateway::AccessError,
        gateway_config::GatewayConfigManifest,
        permission::{AnonymousUser, UserContext},
    },
    infrastructure::{EventBus, StaticUserDirectory},
};

#[derive(Args)]
pub struct CheckArgs {
    /// Request path, e.g. /assets/img/logo.png
    #[arg(value_name = "PATH")]
    path: String,

    /// Evaluate as the user owning this bearer token
    #[arg(long, conflicts_with = "admin")]
    token: Option<String>,

    /// Evaluate as an administrator
    #[arg(long)]
    admin: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

/// Caller for `--admin`
struct CliAdmin;

impl UserContext for CliAdmin {
    fn is_admin(&self) -> bool {
        true
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn has_permission(&self, _permission: &str) -> bool {
        false
    }

    fn identity(&self) -> Option<&str> {
        Some("cli-admin")
    }
}

pub async fn run(args: CheckArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, source_path) = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let (registry_service, _) =
        super::load_registry(&config, source_path.as_deref(), event_bus.clone()).await?;
    let users = StaticUserDirectory::from_config(&config.spec.auth)
        .context("Failed to load users")?;
    let gateway = super::build_gateway(&config, registry_service.registry().clone(), event_bus);

    let user: &dyn UserContext = if args.admin {
        &CliAdmin
    } else if let Some(token) = &args.token {
        match users.lookup(token) {
            Some(user) => user,
            None => {
                eprintln!("{}", "Unknown token, evaluating as anonymous".yellow());
                &AnonymousUser
            }
        }
    } else {
        &AnonymousUser
    };
    let caller = user.identity().unwrap_or("anonymous").to_string();

    let outcome = gateway.fetch(&args.path, user).await;

    if args.json {
        let report = match &outcome {
            Ok(file) => serde_json::json!({
                "path": args.path,
                "user": caller,
                "granted": true,
                "file": file,
                "exists": file.absolute_path.is_file(),
            }),
            Err(e) => serde_json::json!({
                "path": args.path,
                "user": caller,
                "granted": false,
                "error": error_kind(e),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &outcome {
            Ok(file) => {
                println!("{}", format!("✓ Granted to {}", caller).green());
                println!("  File: {}", file.absolute_path.display());
                println!("  MIME type: {}", file.mime_type);
                println!("  Disposition: {}", file.disposition);
                if !file.absolute_path.is_file() {
                    println!("  {}", "(no regular file at this path; serve would answer 404)".dimmed());
                }
            }
            Err(e) => {
                println!("{}", format!("✗ {} ({})", e, error_kind(e)).red());
            }
        }
    }

    match outcome {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Access check failed: {}", error_kind(&e))),
    }
}

fn error_kind(error: &AccessError) -> &'static str {
    match error {
        AccessError::NotFound => "not_found",
        AccessError::AuthenticationRequired => "authentication_required",
        AccessError::Io(_) => "io",
    }
}
