// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for AssetGate CLI

pub mod check;
pub mod config;
pub mod serve;

pub use self::check::CheckArgs;
pub use self::config::ConfigCommand;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use assetgate_core::{
    application::RegistryService,
    domain::{
        gateway::{AssetGateway, EventPublisher},
        gateway_config::GatewayConfigManifest,
        path_resolver::PathResolver,
        path_sanitizer::PathSanitizer,
        registry::VolumeRegistry,
        volume_source::VolumeSource,
    },
    infrastructure::{LocalFileStreamer, ManifestVolumeSource, StaticVolumeSource},
};

/// Load the volume registry the way `serve` does.
///
/// With a config file the volumes are re-read from it on every reload
/// (and their roots must exist); otherwise the in-memory list is used.
pub async fn load_registry(
    config: &GatewayConfigManifest,
    source_path: Option<&Path>,
    event_publisher: Arc<dyn EventPublisher>,
) -> Result<(Arc<RegistryService>, usize)> {
    let source: Arc<dyn VolumeSource> = match source_path {
        Some(path) => Arc::new(ManifestVolumeSource::new(path)),
        None => Arc::new(StaticVolumeSource::new(config.volumes()?)),
    };
    let service = Arc::new(RegistryService::new(
        Arc::new(VolumeRegistry::new()),
        source,
        event_publisher,
    ));
    let count = service.reload().await.context("Failed to load volumes")?;
    Ok((service, count))
}

/// Gateway wired with the streaming settings from `spec.streaming`
pub fn build_gateway(
    config: &GatewayConfigManifest,
    registry: Arc<VolumeRegistry>,
    event_publisher: Arc<dyn EventPublisher>,
) -> AssetGateway {
    let streaming = &config.spec.streaming;
    AssetGateway::new(
        registry,
        Arc::new(LocalFileStreamer::with_chunk_size(streaming.chunk_size_bytes)),
        event_publisher,
    )
    .with_resolver(PathResolver::with_sanitizer(PathSanitizer::with_max_length(
        streaming.max_path_length,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetgate_core::domain::gateway::AccessError;
    use assetgate_core::infrastructure::EventBus;
    use tempfile::TempDir;

    struct Admin;

    impl assetgate_core::domain::permission::UserContext for Admin {
        fn is_admin(&self) -> bool {
            true
        }

        fn is_authenticated(&self) -> bool {
            true
        }

        fn has_permission(&self, _permission: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_gateway_honors_max_path_length() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("assetgate.yaml");
        std::fs::write(
            &config_path,
            format!(
                "apiVersion: assetgate/v1\nkind: GatewayConfig\nmetadata:\n  name: t\nspec:\n  volumes:\n    - name: assets\n      url: /assets\n      path: {}\n  streaming:\n    max_path_length: 16\n",
                temp_dir.path().display()
            ),
        )
        .unwrap();
        let config = GatewayConfigManifest::from_yaml_file(&config_path).unwrap();

        let event_bus = Arc::new(EventBus::default());
        let (service, count) = load_registry(&config, Some(&config_path), event_bus.clone())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let gateway = build_gateway(&config, service.registry().clone(), event_bus);
        assert!(gateway.fetch("assets/short.png", &Admin).await.is_ok());
        assert!(matches!(
            gateway
                .fetch("assets/a/much/longer/path/than/sixteen.png", &Admin)
                .await,
            Err(AccessError::NotFound)
        ));
    }
}
