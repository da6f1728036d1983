// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Registry Service Application Service
//!
//! Orchestrates volume reloads:
//! - Pulls the complete volume set from the injected [`VolumeSource`]
//! - Swaps it into the shared [`VolumeRegistry`] (all-or-nothing)
//! - Publishes `RegistryReloaded` / `RegistryReloadFailed` audit events
//!
//! A failed reload leaves the previous snapshot serving requests.

use crate::domain::events::AccessEvent;
use crate::domain::gateway::EventPublisher;
use crate::domain::registry::VolumeRegistry;
use crate::domain::volume_source::VolumeSource;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

pub struct RegistryService {
    registry: Arc<VolumeRegistry>,
    source: Arc<dyn VolumeSource>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl RegistryService {
    pub fn new(
        registry: Arc<VolumeRegistry>,
        source: Arc<dyn VolumeSource>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            registry,
            source,
            event_publisher,
        }
    }

    pub fn registry(&self) -> &Arc<VolumeRegistry> {
        &self.registry
    }

    /// Reload every volume from the source.
    ///
    /// Returns the number of volumes now being served.
    pub async fn reload(&self) -> Result<usize> {
        match self.try_reload().await {
            Ok(count) => {
                info!(volume_count = count, "Volume registry reloaded");
                metrics::counter!("assetgate_registry_reloads_total", "outcome" => "success")
                    .increment(1);
                self.event_publisher
                    .publish_access_event(AccessEvent::RegistryReloaded {
                        volume_count: count,
                        reloaded_at: Utc::now(),
                    })
                    .await;
                Ok(count)
            }
            Err(e) => {
                error!(
                    error = %format!("{:#}", e),
                    kept_volumes = self.registry.len(),
                    "Volume registry reload failed, keeping previous volumes"
                );
                metrics::counter!("assetgate_registry_reloads_total", "outcome" => "failure")
                    .increment(1);
                self.event_publisher
                    .publish_access_event(AccessEvent::RegistryReloadFailed {
                        error: format!("{:#}", e),
                        failed_at: Utc::now(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn try_reload(&self) -> Result<usize> {
        let volumes = self
            .source
            .load_volumes()
            .await
            .context("Failed to load volumes from source")?;
        let count = volumes.len();
        self.registry
            .load(volumes)
            .context("Rejected volume set")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::volume::{Volume, VolumeError};
    use crate::domain::volume_source::VolumeSourceError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<AccessEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_access_event(&self, event: AccessEvent) {
            self.events.lock().push(event);
        }
    }

    /// Serves whatever volume list (or error) it currently holds
    struct SwappableSource {
        next: Mutex<Result<Vec<Volume>, String>>,
    }

    impl SwappableSource {
        fn new(volumes: Vec<Volume>) -> Self {
            Self {
                next: Mutex::new(Ok(volumes)),
            }
        }

        fn set(&self, next: Result<Vec<Volume>, String>) {
            *self.next.lock() = next;
        }
    }

    #[async_trait]
    impl VolumeSource for SwappableSource {
        async fn load_volumes(&self) -> Result<Vec<Volume>, VolumeSourceError> {
            self.next
                .lock()
                .clone()
                .map_err(VolumeSourceError::Unavailable)
        }
    }

    fn volume(name: &str, prefix: &str) -> Volume {
        Volume::new(name, prefix, format!("/data/{}", name)).unwrap()
    }

    fn service(source: Arc<SwappableSource>) -> (RegistryService, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = RegistryService::new(
            Arc::new(VolumeRegistry::new()),
            source,
            publisher.clone(),
        );
        (service, publisher)
    }

    #[tokio::test]
    async fn test_reload_swaps_registry() {
        let source = Arc::new(SwappableSource::new(vec![
            volume("assets", "assets"),
            volume("docs", "docs"),
        ]));
        let (service, publisher) = service(source);

        assert_eq!(service.reload().await.unwrap(), 2);
        assert_eq!(service.registry().len(), 2);
        assert!(service.registry().find_by_prefix("docs/a.pdf").is_some());

        let events = publisher.events.lock();
        assert!(matches!(
            events.as_slice(),
            [AccessEvent::RegistryReloaded { volume_count: 2, .. }]
        ));
    }

    #[tokio::test]
    async fn test_failed_source_keeps_previous_volumes() {
        let source = Arc::new(SwappableSource::new(vec![volume("assets", "assets")]));
        let (service, publisher) = service(source.clone());
        service.reload().await.unwrap();

        source.set(Err("database offline".to_string()));
        assert!(service.reload().await.is_err());

        assert_eq!(service.registry().len(), 1);
        assert!(service.registry().find_by_prefix("assets/a.png").is_some());

        let events = publisher.events.lock();
        assert_eq!(events.len(), 2);
        match &events[1] {
            AccessEvent::RegistryReloadFailed { error, .. } => {
                assert!(error.contains("database offline"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_prefixes_rejected() {
        let source = Arc::new(SwappableSource::new(vec![volume("assets", "assets")]));
        let (service, _publisher) = service(source.clone());
        service.reload().await.unwrap();

        source.set(Ok(vec![volume("one", "shared"), volume("two", "/shared/")]));
        let err = service.reload().await.unwrap_err();
        assert!(format!("{:#}", err).contains("shared"));
        assert!(service.registry().find_by_prefix("assets/a.png").is_some());
        assert!(service.registry().find_by_prefix("shared/a.png").is_none());
    }

    #[test]
    fn test_invalid_volume_error_converts() {
        let err: VolumeSourceError = VolumeError::EmptyPrefix("x".to_string()).into();
        assert!(err.to_string().contains("Invalid volume definition"));
    }
}
