//! `WatchSyncService`: the surface the host plugin talks to.
//!
//! Wires the use cases together once at start-up and exposes the
//! remote-data-service style entry points (configuration checks, uploads,
//! device selection).

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use lw_core::ports::{AccessoryEvent, AccessoryTransportPort};
use lw_core::{CompanionApp, Device, DosingDecision, GlucoseSample, WatchState};

use crate::deps::WatchSyncDeps;
use crate::settings::SyncSettings;
use crate::usecases::{
    DeviceRegistry, InboundEventBridge, InboundOutcome, MessageDispatcher, PairingError,
    PairingSession, SnapshotProvider, StateAggregator, ThrottledPublisher,
};

/// Newest glucose samples considered per upload.
pub const GLUCOSE_DATA_LIMIT: usize = 2;
/// Dosing decisions considered per upload (only the newest is applied).
pub const DOSING_DECISION_DATA_LIMIT: usize = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// No device has been paired yet.
    #[error("no paired device, select a device first")]
    MissingCredentials,
}

pub struct WatchSyncService {
    transport: Arc<dyn AccessoryTransportPort>,
    registry: Arc<DeviceRegistry>,
    pairing: PairingSession,
    aggregator: Arc<StateAggregator>,
    publisher: Arc<ThrottledPublisher>,
    bridge: Arc<InboundEventBridge>,
}

impl WatchSyncService {
    /// Build the pipeline and restore the persisted devices.
    ///
    /// Must be called inside a tokio runtime: the throttled publisher spawns
    /// its delivery loop here.
    pub async fn start(deps: WatchSyncDeps, settings: SyncSettings) -> Self {
        let span = info_span!(
            "usecase.watch_sync.start",
            throttle_secs = settings.throttle_interval.as_secs(),
            selection_timeout_secs = settings.selection_timeout.as_secs()
        );

        async move {
            let WatchSyncDeps {
                secret_store,
                transport,
            } = deps;

            let registry = Arc::new(DeviceRegistry::new(secret_store, transport.clone()));
            let restored = registry.restore().await;

            let dispatcher = Arc::new(MessageDispatcher::new(registry.clone(), transport.clone()));
            let publisher = ThrottledPublisher::start(settings.throttle_interval, dispatcher);
            let aggregator = Arc::new(StateAggregator::new(publisher.clone()));
            let pairing =
                PairingSession::new(transport.clone(), registry.clone(), settings.selection_timeout);
            let bridge = Arc::new(InboundEventBridge::new(publisher.clone()));

            info!(device_count = restored.len(), "Watch sync service started");
            Self {
                transport,
                registry,
                pairing,
                aggregator,
                publisher,
                bridge,
            }
        }
        .instrument(span)
        .await
    }

    /// Whether at least one device is paired.
    pub async fn has_configuration(&self) -> bool {
        !self.registry.is_empty().await
    }

    pub async fn verify_configuration(&self) -> Result<(), SyncError> {
        if self.has_configuration().await {
            Ok(())
        } else {
            Err(SyncError::MissingCredentials)
        }
    }

    pub async fn list_devices(&self) -> Vec<Device> {
        self.registry.devices().await
    }

    pub async fn companion_apps(&self) -> Vec<CompanionApp> {
        self.registry.companion_apps().await
    }

    /// See [`PairingSession::select_devices`]. An empty list means the request
    /// timed out.
    pub async fn select_devices(&self) -> Result<Vec<Device>, PairingError> {
        self.pairing.select_devices().await
    }

    pub async fn handle_selection_response(&self, payload: &str) -> Vec<Device> {
        self.pairing.handle_selection_response(payload).await
    }

    /// Drop every paired device and persist the empty set.
    pub async fn forget_devices(&self) {
        info!("Forgetting all paired devices");
        self.registry.replace_devices(Vec::new()).await;
    }

    /// Apply stored glucose samples, newest first.
    ///
    /// Without a paired device this succeeds without doing anything. An empty
    /// batch reports `false`.
    pub async fn upload_glucose_data(&self, stored: &[GlucoseSample]) -> bool {
        if !self.has_configuration().await {
            return true;
        }
        let newest = &stored[..stored.len().min(GLUCOSE_DATA_LIMIT)];
        self.aggregator.apply_glucose_samples(newest).await
    }

    /// Apply the newest (last) of the stored dosing decisions.
    pub async fn upload_dosing_decision_data(&self, stored: &[DosingDecision]) -> bool {
        if !self.has_configuration().await {
            return true;
        }
        let Some(latest) = stored.last() else {
            return false;
        };
        self.aggregator.apply_dosing_decision(latest).await;
        true
    }

    /// Register the provider answering inbound status requests.
    pub fn set_state_provider(&self, provider: Arc<dyn SnapshotProvider>) {
        self.bridge.set_provider(provider);
    }

    pub fn clear_state_provider(&self) {
        self.bridge.clear_provider();
    }

    /// The aggregator, usable as the status-request provider.
    pub fn aggregator(&self) -> Arc<StateAggregator> {
        self.aggregator.clone()
    }

    pub async fn snapshot(&self) -> WatchState {
        self.aggregator.snapshot().await
    }

    pub async fn handle_accessory_event(&self, event: AccessoryEvent) -> InboundOutcome {
        self.bridge.handle_event(event).await
    }

    /// Convenience for hosts that deliver a raw app message.
    pub async fn handle_app_message(&self, payload: &Value, app: &CompanionApp) -> InboundOutcome {
        self.bridge.message_received(payload, app).await
    }

    /// Subscribe to transport events and feed them to the inbound bridge on a
    /// background task.
    pub async fn spawn_event_loop(&self) -> Option<JoinHandle<()>> {
        match self.transport.subscribe_events().await {
            Ok(events) => Some(tokio::spawn(self.bridge.clone().run(events))),
            Err(err) => {
                warn!(error = %err, "Accessory events unavailable, status requests disabled");
                None
            }
        }
    }

    /// Whether a snapshot is waiting for the next interval boundary.
    pub fn has_pending_delivery(&self) -> bool {
        self.publisher.has_pending()
    }

    /// Stop the delivery loop. Pending snapshots are dropped.
    pub fn shutdown(&self) {
        self.publisher.stop();
        info!("Watch sync service stopped");
    }
}
