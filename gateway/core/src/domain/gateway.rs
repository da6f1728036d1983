// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AssetGateway - access-gated entry point for file downloads
//!
//! The single security boundary between a transport (HTTP, CLI) and the
//! volume roots. Each request goes through:
//! 1. Path resolution (volume match + traversal guard)
//! 2. Permission evaluation (admin → primary id → legacy id)
//! 3. MIME / disposition classification
//! 4. Optional hand-off to the injected [`FileStreamer`]
//!
//! Every outcome is published as an [`AccessEvent`]. The error returned to
//! the caller is deliberately coarse: an unmatched volume, a rejected path,
//! a missing file and an authenticated denial all look the same.

use crate::domain::{
    asset::ResolvedFile,
    events::{AccessEvent, RequestId},
    path_resolver::{PathResolver, ResolveError},
    permission::{AccessDecision, PermissionEvaluator, UserContext},
    registry::VolumeRegistry,
    streaming::{FileStream, FileStreamer, StreamError},
    volume::normalize_url_path,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// Errors visible to the transport layer.
///
/// Display strings never carry volume roots, permission identifiers or
/// whether a directory exists.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Sorry. File not found or permission denied")]
    NotFound,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Failed to read file")]
    Io(#[source] std::io::Error),
}

/// Event publisher trait (abstraction for event bus)
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_access_event(&self, event: AccessEvent);
}

/// A granted file together with its opened body
#[derive(Debug)]
pub struct AssetDownload {
    pub file: ResolvedFile,
    pub stream: FileStream,
}

/// Internal result of a successful authorization
struct Grant {
    volume: String,
    path: String,
    file: ResolvedFile,
}

/// Access-gated file gateway
pub struct AssetGateway {
    /// Shared volume snapshot (reloaded elsewhere)
    registry: Arc<VolumeRegistry>,
    resolver: PathResolver,
    evaluator: PermissionEvaluator,
    /// Streaming backend (local filesystem, mocks, ...)
    streamer: Arc<dyn FileStreamer>,
    /// Event publisher (injected, not owned)
    event_publisher: Arc<dyn EventPublisher>,
}

impl AssetGateway {
    pub fn new(
        registry: Arc<VolumeRegistry>,
        streamer: Arc<dyn FileStreamer>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            registry,
            resolver: PathResolver::new(),
            evaluator: PermissionEvaluator::new(),
            streamer,
            event_publisher,
        }
    }

    /// Replace the default path resolver (e.g. for a custom length limit)
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &Arc<VolumeRegistry> {
        &self.registry
    }

    /// Decide whether `user` may fetch `request_path`.
    ///
    /// Returns the classified file without touching the filesystem.
    pub async fn fetch(
        &self,
        request_path: &str,
        user: &dyn UserContext,
    ) -> Result<ResolvedFile, AccessError> {
        let grant = self.authorize(RequestId::new(), request_path, user).await?;
        Ok(grant.file)
    }

    /// [`fetch`](Self::fetch), then open the file through the streamer.
    pub async fn open(
        &self,
        request_path: &str,
        user: &dyn UserContext,
    ) -> Result<AssetDownload, AccessError> {
        let request_id = RequestId::new();
        let grant = self.authorize(request_id, request_path, user).await?;

        match self.streamer.open(&grant.file).await {
            Ok(stream) => Ok(AssetDownload {
                file: grant.file,
                stream,
            }),
            Err(StreamError::NotFound) | Err(StreamError::NotAFile) => {
                tracing::debug!(%request_id, path = %grant.path, "Granted path has no regular file");
                record_outcome("missing");
                Err(AccessError::NotFound)
            }
            Err(StreamError::Io(e)) => {
                tracing::error!(%request_id, path = %grant.path, error = %e, "Failed to open file");
                record_outcome("io_error");
                self.event_publisher
                    .publish_access_event(AccessEvent::StreamFailed {
                        request_id,
                        volume: grant.volume,
                        path: grant.path,
                        error: e.to_string(),
                        failed_at: Utc::now(),
                    })
                    .await;
                Err(AccessError::Io(e))
            }
        }
    }

    async fn authorize(
        &self,
        request_id: RequestId,
        request_path: &str,
        user: &dyn UserContext,
    ) -> Result<Grant, AccessError> {
        // 1. Resolve volume and path
        let resolved = match self.resolver.resolve(request_path, &self.registry) {
            Ok(resolved) => resolved,
            Err(ResolveError::NotFound) => {
                tracing::debug!(%request_id, path = %request_path, "No volume matches request path");
                record_outcome("not_matched");
                self.event_publisher
                    .publish_access_event(AccessEvent::VolumeNotMatched {
                        request_id,
                        path: request_path.to_string(),
                        reason: AccessDecision::volume_not_found().reason,
                        attempted_at: Utc::now(),
                    })
                    .await;
                return Err(AccessError::NotFound);
            }
            Err(ResolveError::InvalidPath(e)) => {
                tracing::warn!(%request_id, path = %request_path, error = %e, "Rejected request path");
                record_outcome("path_rejected");
                let volume = self
                    .registry
                    .find_by_prefix(normalize_url_path(request_path))
                    .map(|v| v.name().to_string())
                    .unwrap_or_default();
                self.event_publisher
                    .publish_access_event(AccessEvent::PathRejected {
                        request_id,
                        volume,
                        path: request_path.to_string(),
                        rejected_at: Utc::now(),
                    })
                    .await;
                return Err(AccessError::NotFound);
            }
        };

        // 2. Evaluate permissions
        let decision = self.evaluator.evaluate(user, &resolved.volume);
        let identity = user.identity().map(str::to_string);

        if !decision.granted {
            let authenticated = user.is_authenticated();
            tracing::info!(
                %request_id,
                volume = %resolved.volume.name(),
                path = %resolved.request_path,
                authenticated,
                "Volume access denied"
            );
            record_outcome("denied");
            self.event_publisher
                .publish_access_event(AccessEvent::AccessDenied {
                    request_id,
                    volume: resolved.volume.name().to_string(),
                    path: resolved.request_path.clone(),
                    user: identity,
                    authenticated,
                    reason: decision.reason,
                    denied_at: Utc::now(),
                })
                .await;

            return Err(if authenticated {
                AccessError::NotFound
            } else {
                AccessError::AuthenticationRequired
            });
        }

        // 3. Classify
        let file = ResolvedFile::classify(resolved.absolute_path);

        tracing::debug!(
            %request_id,
            volume = %resolved.volume.name(),
            path = %resolved.request_path,
            mime_type = %file.mime_type,
            disposition = %file.disposition,
            "Volume access granted"
        );
        record_outcome("granted");
        self.event_publisher
            .publish_access_event(AccessEvent::AccessGranted {
                request_id,
                volume: resolved.volume.name().to_string(),
                path: resolved.request_path.clone(),
                user: identity,
                reason: decision.reason,
                granted_at: Utc::now(),
            })
            .await;

        Ok(Grant {
            volume: resolved.volume.name().to_string(),
            path: resolved.request_path,
            file,
        })
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("assetgate_access_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        asset::Disposition,
        permission::{AccessReason, AnonymousUser},
        volume::Volume,
    };
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Admin;

    impl UserContext for Admin {
        fn is_admin(&self) -> bool {
            true
        }
        fn is_authenticated(&self) -> bool {
            true
        }
        fn has_permission(&self, _permission_key: &str) -> bool {
            false
        }
    }

    struct Member(&'static str);

    impl UserContext for Member {
        fn is_admin(&self) -> bool {
            false
        }
        fn is_authenticated(&self) -> bool {
            true
        }
        fn has_permission(&self, permission_key: &str) -> bool {
            permission_key == self.0
        }
        fn identity(&self) -> Option<&str> {
            Some("member")
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<AccessEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_access_event(&self, event: AccessEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    // Serves a fixed body for any path, or fails with the configured error.
    struct FixedStreamer {
        fail_with: Option<std::io::ErrorKind>,
    }

    #[async_trait]
    impl FileStreamer for FixedStreamer {
        async fn open(&self, _file: &ResolvedFile) -> Result<FileStream, StreamError> {
            match self.fail_with {
                Some(std::io::ErrorKind::NotFound) => Err(StreamError::NotFound),
                Some(kind) => Err(StreamError::Io(std::io::Error::from(kind))),
                None => Ok(FileStream {
                    content_length: 5,
                    body: futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"hello"))]).boxed(),
                }),
            }
        }
    }

    fn gateway_with(
        fail_with: Option<std::io::ErrorKind>,
    ) -> (AssetGateway, Arc<RecordingPublisher>) {
        let registry = VolumeRegistry::with_volumes(vec![
            Volume::new("assets", "assets", "/data/assets")
                .unwrap()
                .with_permission_id("abc")
                .unwrap(),
            Volume::new("docs", "docs", "/data/docs")
                .unwrap()
                .with_permission_id("p1")
                .unwrap()
                .with_legacy_permission_id("9")
                .unwrap(),
            Volume::new("archive", "archive", "/data/archive").unwrap(),
        ])
        .unwrap();
        let publisher = Arc::new(RecordingPublisher::default());
        let gateway = AssetGateway::new(
            Arc::new(registry),
            Arc::new(FixedStreamer { fail_with }),
            publisher.clone(),
        );
        (gateway, publisher)
    }

    #[tokio::test]
    async fn test_admin_fetches_attachment() {
        let (gateway, publisher) = gateway_with(None);
        let file = gateway.fetch("assets/img/a.png", &Admin).await.unwrap();

        assert_eq!(file.absolute_path, PathBuf::from("/data/assets/img/a.png"));
        assert_eq!(file.filename, "a.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.disposition, Disposition::Attachment);

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "access_granted");
    }

    #[tokio::test]
    async fn test_legacy_permission_pdf_inline() {
        let (gateway, _) = gateway_with(None);
        let file = gateway
            .fetch("docs/report.pdf", &Member("viewvolume:9"))
            .await
            .unwrap();
        assert_eq!(file.disposition, Disposition::Inline);
        assert_eq!(file.absolute_path, PathBuf::from("/data/docs/report.pdf"));
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let (gateway, publisher) = gateway_with(None);
        let result = gateway.fetch("assets/../../etc/passwd", &Admin).await;
        assert!(matches!(result, Err(AccessError::NotFound)));

        let events = publisher.events.lock().unwrap();
        match &events[0] {
            AccessEvent::PathRejected { volume, .. } => assert_eq!(volume, "assets"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found_for_everyone() {
        let (gateway, publisher) = gateway_with(None);
        assert!(matches!(gateway.fetch("images/a.png", &Admin).await, Err(AccessError::NotFound)));
        assert!(matches!(
            gateway.fetch("images/a.png", &AnonymousUser).await,
            Err(AccessError::NotFound)
        ));

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        for event in events.iter() {
            match event {
                AccessEvent::VolumeNotMatched { reason, .. } => {
                    assert_eq!(*reason, AccessReason::VolumeNotFound);
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_admin_reads_volume_without_identifiers() {
        let (gateway, publisher) = gateway_with(None);

        let file = gateway.fetch("archive/2019/ledger.csv", &Admin).await.unwrap();
        assert_eq!(file.absolute_path, PathBuf::from("/data/archive/2019/ledger.csv"));

        let member = gateway
            .fetch("archive/2019/ledger.csv", &Member("viewvolume:abc"))
            .await;
        assert!(matches!(member, Err(AccessError::NotFound)));

        let events = publisher.events.lock().unwrap();
        match &events[0] {
            AccessEvent::AccessGranted { reason, .. } => {
                assert_eq!(*reason, AccessReason::AdminOverride);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match &events[1] {
            AccessEvent::AccessDenied { reason, .. } => {
                assert_eq!(*reason, AccessReason::PermissionDenied);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_denied_classification() {
        let (gateway, publisher) = gateway_with(None);

        let anonymous = gateway.fetch("assets/a.png", &AnonymousUser).await;
        assert!(matches!(anonymous, Err(AccessError::AuthenticationRequired)));

        let member = gateway.fetch("assets/a.png", &Member("viewvolume:other")).await;
        assert!(matches!(member, Err(AccessError::NotFound)));

        let events = publisher.events.lock().unwrap();
        assert!(events.iter().all(|e| e.kind() == "access_denied"));
    }

    #[tokio::test]
    async fn test_open_streams_body() {
        let (gateway, _) = gateway_with(None);
        let download = gateway.open("assets/a.png", &Admin).await.unwrap();
        assert_eq!(download.stream.content_length, 5);

        let chunks: Vec<_> = download.stream.body.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0].as_ref().unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn test_open_missing_file_is_not_found() {
        let (gateway, _) = gateway_with(Some(std::io::ErrorKind::NotFound));
        let result = gateway.open("assets/a.png", &Admin).await;
        assert!(matches!(result, Err(AccessError::NotFound)));
    }

    #[tokio::test]
    async fn test_open_io_failure_propagates() {
        let (gateway, publisher) = gateway_with(Some(std::io::ErrorKind::PermissionDenied));
        let result = gateway.open("assets/a.png", &Admin).await;
        assert!(matches!(result, Err(AccessError::Io(_))));

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.last().unwrap().kind(), "stream_failed");
    }

    #[test]
    fn test_error_messages_do_not_leak() {
        assert_eq!(
            AccessError::NotFound.to_string(),
            "Sorry. File not found or permission denied"
        );
        let io = AccessError::Io(std::io::Error::other("/data/assets/x"));
        assert_eq!(io.to_string(), "Failed to read file");
    }
}
