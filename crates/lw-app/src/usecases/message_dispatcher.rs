//! Fan-out of a snapshot to every companion app of every paired device.
//!
//! Delivery is best effort: apps that are not installed are skipped, failed
//! sends are logged and never retried, and nothing is reported back into the
//! synchronization pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use lw_core::ports::{AccessoryTransportPort, SendProgress};
use lw_core::{CompanionApp, WatchState};

use super::device_registry::DeviceRegistry;
use super::throttled_publisher::SnapshotSink;

/// Per-app delivery result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NotInstalled,
    Failed,
}

/// Tally of one publish round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent => self.sent += 1,
            Delivery::NotInstalled => self.skipped += 1,
            Delivery::Failed => self.failed += 1,
        }
    }
}

pub struct MessageDispatcher {
    registry: Arc<DeviceRegistry>,
    transport: Arc<dyn AccessoryTransportPort>,
}

impl MessageDispatcher {
    pub fn new(registry: Arc<DeviceRegistry>, transport: Arc<dyn AccessoryTransportPort>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Send `snapshot` to all known companion apps concurrently.
    pub async fn dispatch(&self, snapshot: &WatchState) -> DispatchReport {
        let span = info_span!("usecase.message_dispatcher.dispatch");

        async {
            let message = match serde_json::to_value(snapshot) {
                Ok(message) => message,
                Err(err) => {
                    warn!(error = %err, "Cannot encode watch state");
                    return DispatchReport::default();
                }
            };

            let apps = self.registry.companion_apps().await;
            if apps.is_empty() {
                debug!("No companion apps registered, nothing to send");
                return DispatchReport::default();
            }

            let deliveries = join_all(apps.iter().map(|app| self.deliver(app, &message))).await;

            let mut report = DispatchReport::default();
            for delivery in deliveries {
                report.record(delivery);
            }
            info!(
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "Watch state dispatched"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn deliver(&self, app: &CompanionApp, message: &Value) -> Delivery {
        let status = match self.transport.app_status(app).await {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    device_id = %app.device.id,
                    app = app.kind.as_str(),
                    error = %err,
                    "Install status query failed"
                );
                return Delivery::Failed;
            }
        };

        if !status.is_installed() {
            debug!(device_id = %app.device.id, app = app.kind.as_str(), "Companion app not installed");
            return Delivery::NotInstalled;
        }

        debug!(device_id = %app.device.id, app = app.kind.as_str(), "Sending message to companion app");
        let progress = LoggedProgress { app };
        match self.transport.send_message(app, message, &progress).await {
            Ok(()) => {
                debug!(device_id = %app.device.id, app = app.kind.as_str(), "Message sent");
                Delivery::Sent
            }
            Err(err) => {
                warn!(
                    device_id = %app.device.id,
                    app = app.kind.as_str(),
                    error = %err,
                    "Message failed"
                );
                Delivery::Failed
            }
        }
    }
}

#[async_trait]
impl SnapshotSink for MessageDispatcher {
    async fn publish(&self, snapshot: WatchState) {
        self.dispatch(&snapshot).await;
    }
}

struct LoggedProgress<'a> {
    app: &'a CompanionApp,
}

impl SendProgress for LoggedProgress<'_> {
    fn on_progress(&self, sent_bytes: u64, total_bytes: u64) {
        trace!(
            device_id = %self.app.device.id,
            app = self.app.kind.as_str(),
            sent_bytes,
            total_bytes,
            "Send progress"
        );
    }
}
