// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AssetGate CLI
//!
//! The `assetgate` binary serves volume-gated files over HTTP and offers
//! offline tooling around the same configuration.
//!
//! ## Commands
//!
//! - `assetgate serve` - Run the HTTP gateway (SIGHUP reloads volumes)
//! - `assetgate check <path>` - Evaluate one request without streaming
//! - `assetgate config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use assetgate_core::domain::gateway_config::{GatewayConfigManifest, LoggingConfig};

mod commands;

use commands::{CheckArgs, ConfigCommand};

/// AssetGate - volume-scoped access control and gated file serving
#[derive(Parser)]
#[command(name = "assetgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ASSETGATE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true, env = "ASSETGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json); defaults to the config file
    #[arg(long, global = true, env = "ASSETGATE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve gated files over HTTP
    #[command(name = "serve")]
    Serve,

    /// Evaluate a request path offline
    #[command(name = "check")]
    Check(CheckArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logging = logging_settings(cli.config.as_ref());
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    init_logging(&logging)?;

    match cli.command {
        Commands::Serve => commands::serve::run(cli.config).await,
        Commands::Check(args) => commands::check::run(args, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Logging section of whichever config file would be loaded.
///
/// Read quietly before the subscriber exists; load errors surface later
/// when the command loads the file for real.
fn logging_settings(config_override: Option<&PathBuf>) -> LoggingConfig {
    config_override
        .cloned()
        .or_else(GatewayConfigManifest::discover_config)
        .and_then(|path| GatewayConfigManifest::from_yaml_file(path).ok())
        .unwrap_or_default()
        .logging()
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&logging.level))
        .context("Failed to create log filter")?;

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init(),
    }

    Ok(())
}
