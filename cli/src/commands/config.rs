// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use assetgate_core::domain::gateway_config::GatewayConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./assetgate.yaml)
        #[arg(short, long, default_value = "./assetgate.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. ASSETGATE_CONFIG_PATH: {}",
            std::env::var("ASSETGATE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./assetgate.yaml");
        println!("  4. ~/.assetgate/config.yaml");
        println!("  5. /etc/assetgate/config.yaml");
        println!();
    }

    let (config, source) = GatewayConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    match &source {
        Some(path) => println!("  Source: {}", path.display()),
        None => println!("  Source: {}", "(built-in defaults)".dimmed()),
    }
    println!();

    // Node identity
    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!(
        "  Listen: {}:{}",
        config.spec.network.bind_address, config.spec.network.port
    );
    println!();

    // Volumes, in matching order
    println!("{}", "Volumes (first match wins):".bold());
    if config.spec.volumes.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (index, volume) in config.spec.volumes.iter().enumerate() {
        println!("  {}. {} → {}", index + 1, volume.name.bold(), volume.url);
        println!("     Root: {}", volume.path.display());
        println!(
            "     Permission id: {}",
            volume.permission_id.as_deref().unwrap_or("(none)")
        );
        if let Some(legacy) = &volume.legacy_permission_id {
            println!("     Legacy permission id: {}", legacy);
        }
    }
    println!();

    // Auth
    let auth = &config.spec.auth;
    println!("{}", "Auth:".bold());
    println!(
        "  Login URL: {}",
        auth.login_url.as_deref().unwrap_or("(none, 401 responses)")
    );
    println!("  Users: {}", auth.users.len());
    for user in &auth.users {
        let role = if user.admin { "admin" } else { "user" };
        println!(
            "    - {} ({}, {} permissions)",
            user.name,
            role,
            user.permissions.len()
        );
    }
    println!();

    let logging = config.logging();
    println!("{}", "Logging:".bold());
    println!("  Level: {}", logging.level);
    println!("  Format: {}", logging.format);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let (config, _) = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    // serve refuses to start on a missing root, so report it here too
    for volume in config.volumes()? {
        volume
            .ensure_root_exists()
            .with_context(|| format!("Volume root {}", volume.root_path().display()))?;
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
