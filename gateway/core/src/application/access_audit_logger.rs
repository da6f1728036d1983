// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Access Audit Logger Application Service
//!
//! Subscribes to access events from the event bus and writes them to the
//! `assetgate::audit` tracing target, one structured record per event.
//! Runs as a background task and never fails the gateway: bus lag and
//! serialization errors are logged and skipped.

use crate::domain::events::AccessEvent;
use crate::infrastructure::event_bus::{EventBus, EventBusError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const AUDIT_TARGET: &str = "assetgate::audit";

#[derive(Debug, Default)]
struct AuditCounters {
    processed: AtomicU64,
    lagged: AtomicU64,
}

pub struct AccessAuditLogger {
    event_bus: Arc<EventBus>,
    counters: Arc<AuditCounters>,
}

impl AccessAuditLogger {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            counters: Arc::new(AuditCounters::default()),
        }
    }

    /// Events written so far
    pub fn events_processed(&self) -> u64 {
        self.counters.processed.load(Ordering::Relaxed)
    }

    /// Events dropped because the logger fell behind the bus
    pub fn events_lagged(&self) -> u64 {
        self.counters.lagged.load(Ordering::Relaxed)
    }

    /// Start the background audit task.
    ///
    /// The subscription is taken before spawning, so every event published
    /// after this returns is seen. The task ends once every sender of the
    /// bus is dropped.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!("Starting access audit logger background task");

        let mut receiver = self.event_bus.subscribe();
        let counters = self.counters.clone();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        write_audit_record(&event);
                        let processed = counters.processed.fetch_add(1, Ordering::Relaxed) + 1;
                        if processed % 1000 == 0 {
                            debug!("Access audit logger processed {} events", processed);
                        }
                    }
                    Err(EventBusError::Closed) => {
                        info!(
                            "Event bus closed, shutting down access audit logger \
                             (processed {} events)",
                            counters.processed.load(Ordering::Relaxed)
                        );
                        break;
                    }
                    Err(EventBusError::Lagged(n)) => {
                        counters.lagged.fetch_add(n, Ordering::Relaxed);
                        warn!(
                            "Access audit logger lagged by {} events, \
                             some audit records were lost",
                            n
                        );
                    }
                }
            }
        })
    }
}

fn write_audit_record(event: &AccessEvent) {
    match serde_json::to_string(event) {
        Ok(record) => match event {
            AccessEvent::PathRejected { .. }
            | AccessEvent::StreamFailed { .. }
            | AccessEvent::RegistryReloadFailed { .. } => {
                warn!(target: AUDIT_TARGET, kind = event.kind(), %record)
            }
            _ => info!(target: AUDIT_TARGET, kind = event.kind(), %record),
        },
        Err(e) => error!(
            target: AUDIT_TARGET,
            kind = event.kind(),
            error = %e,
            "Failed to serialize access event"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::RequestId;
    use crate::domain::permission::AccessReason;
    use chrono::Utc;
    use std::time::Duration;

    fn not_matched() -> AccessEvent {
        AccessEvent::VolumeNotMatched {
            request_id: RequestId::new(),
            path: "nowhere/a.png".to_string(),
            reason: AccessReason::VolumeNotFound,
            attempted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_logger_processes_events() {
        let event_bus = Arc::new(EventBus::with_default_capacity());
        let logger = Arc::new(AccessAuditLogger::new(event_bus.clone()));
        let _handle = logger.clone().start();

        event_bus.publish(not_matched());
        event_bus.publish(AccessEvent::RegistryReloaded {
            volume_count: 3,
            reloaded_at: Utc::now(),
        });

        for _ in 0..50 {
            if logger.events_processed() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(logger.events_processed(), 2);
        assert_eq!(logger.events_lagged(), 0);
    }

    #[tokio::test]
    async fn test_logger_stops_when_bus_dropped() {
        let event_bus = Arc::new(EventBus::with_default_capacity());
        let handle = Arc::new(AccessAuditLogger::new(event_bus.clone())).start();

        drop(event_bus);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("audit logger did not stop")
            .unwrap();
    }
}
