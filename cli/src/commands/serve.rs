// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `assetgate serve`: HTTP gateway with graceful shutdown and SIGHUP reload

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use assetgate_core::{
    application::{AccessAuditLogger, RegistryService},
    domain::gateway_config::GatewayConfigManifest,
    infrastructure::{EventBus, StaticUserDirectory},
    presentation::api::{app, AppState},
};

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let (config, source_path) = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(node = %config.metadata.name, "Configuration loaded");

    if let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
        .filter(|m| m.enabled)
    {
        let addr: SocketAddr = format!("{}:{}", config.spec.network.bind_address, metrics.port)
            .parse()
            .context("Invalid metrics listen address")?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    // Audit trail
    let event_bus = Arc::new(EventBus::with_default_capacity());
    let _audit_handle = Arc::new(AccessAuditLogger::new(event_bus.clone())).start();

    let (registry_service, volume_count) =
        super::load_registry(&config, source_path.as_deref(), event_bus.clone()).await?;
    if volume_count == 0 {
        warn!("No volumes configured; every file request will be answered with 404");
    }

    let users = Arc::new(
        StaticUserDirectory::from_config(&config.spec.auth).context("Failed to load users")?,
    );
    info!(volumes = volume_count, users = users.len(), "Gateway initialized");

    let gateway = Arc::new(super::build_gateway(
        &config,
        registry_service.registry().clone(),
        event_bus,
    ));

    let state = AppState::new(gateway, users).with_login_url(config.spec.auth.login_url.clone());

    #[cfg(unix)]
    reload_on_hangup(registry_service.clone())?;

    let addr = format!(
        "{}:{}",
        config.spec.network.bind_address, config.spec.network.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("AssetGate listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("AssetGate shutting down");

    Ok(())
}

#[cfg(unix)]
fn reload_on_hangup(service: Arc<RegistryService>) -> Result<()> {
    let mut hangup = signal::unix::signal(signal::unix::SignalKind::hangup())
        .context("Failed to install SIGHUP handler")?;

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP signal, reloading volumes");
            // Failures are logged and audited by the service itself
            let _ = service.reload().await;
        }
    });

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
