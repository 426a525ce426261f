//! Events coming back from the accessory.
//!
//! Status changes are only logged. A companion app sending the literal
//! `"status"` asks for a fresh snapshot; when a provider is registered, its
//! snapshot goes through the throttled publisher like any other update.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, Instrument};

use lw_core::ports::AccessoryEvent;
use lw_core::{CompanionApp, Device, DeviceStatus, WatchState};

use super::throttled_publisher::ThrottledPublisher;

/// Payload a companion app sends to request the current state.
pub const STATUS_REQUEST: &str = "status";

/// Supplies the snapshot answered to a status request.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn current_snapshot(&self) -> Option<WatchState>;
}

/// What the bridge did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    StatusLogged,
    SnapshotQueued,
    NoProvider,
    NoSnapshot,
    Ignored,
}

pub struct InboundEventBridge {
    publisher: Arc<ThrottledPublisher>,
    provider: RwLock<Option<Arc<dyn SnapshotProvider>>>,
}

impl InboundEventBridge {
    pub fn new(publisher: Arc<ThrottledPublisher>) -> Self {
        Self {
            publisher,
            provider: RwLock::new(None),
        }
    }

    pub fn set_provider(&self, provider: Arc<dyn SnapshotProvider>) {
        *self
            .provider
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(provider);
    }

    pub fn clear_provider(&self) {
        *self
            .provider
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub async fn handle_event(&self, event: AccessoryEvent) -> InboundOutcome {
        match event {
            AccessoryEvent::DeviceStatusChanged { device, status } => {
                self.status_changed(&device, status);
                InboundOutcome::StatusLogged
            }
            AccessoryEvent::MessageReceived { payload, app } => {
                self.message_received(&payload, &app).await
            }
        }
    }

    pub fn status_changed(&self, device: &Device, status: DeviceStatus) {
        info!(device_id = %device.id, model = %device.model_name, status = %status, "Device status changed");
    }

    pub async fn message_received(&self, payload: &Value, app: &CompanionApp) -> InboundOutcome {
        let span = info_span!(
            "usecase.inbound.message",
            device_id = %app.device.id,
            app = app.kind.as_str()
        );

        async {
            if payload.as_str() != Some(STATUS_REQUEST) {
                debug!(payload = %payload, "Ignoring inbound message");
                return InboundOutcome::Ignored;
            }

            let provider = self
                .provider
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone();
            let Some(provider) = provider else {
                debug!("Status requested but no snapshot provider registered");
                return InboundOutcome::NoProvider;
            };

            match provider.current_snapshot().await {
                Some(snapshot) => {
                    info!("Status requested, queueing snapshot");
                    self.publisher.push(snapshot);
                    InboundOutcome::SnapshotQueued
                }
                None => {
                    debug!("Snapshot provider had nothing to send");
                    InboundOutcome::NoSnapshot
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Consume transport events until the channel closes.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<AccessoryEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("Accessory event channel closed");
    }
}
