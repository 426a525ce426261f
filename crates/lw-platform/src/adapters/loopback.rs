//! In-process accessory transport.
//!
//! Stands in for the vendor SDK when running headless: selection responses
//! are JSON arrays of device records, outbound messages are logged and kept,
//! and inbound events are injected through [`LoopbackTransport::event_sender`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lw_core::ports::{
    AccessoryEvent, AccessoryTransportPort, AppInstallStatus, SendProgress, TransportError,
};
use lw_core::{CompanionApp, CompanionAppKind, Device, DeviceId};

const EVENT_BUFFER: usize = 64;

/// One message handed to the loopback link.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub app: CompanionApp,
    pub message: Value,
}

pub struct LoopbackTransport {
    install_status: HashMap<CompanionAppKind, AppInstallStatus>,
    selection_requests: AtomicUsize,
    registered_devices: Mutex<Vec<DeviceId>>,
    registered_apps: Mutex<Vec<CompanionApp>>,
    sent: Mutex<Vec<SentMessage>>,
    events_tx: mpsc::Sender<AccessoryEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<AccessoryEvent>>>,
}

impl LoopbackTransport {
    /// Every companion app reports as installed.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            install_status: HashMap::new(),
            selection_requests: AtomicUsize::new(0),
            registered_devices: Mutex::new(Vec::new()),
            registered_apps: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    pub fn with_install_status(mut self, kind: CompanionAppKind, status: AppInstallStatus) -> Self {
        self.install_status.insert(kind, status);
        self
    }

    /// Sender for injecting inbound events, as the SDK delegate would.
    pub fn event_sender(&self) -> mpsc::Sender<AccessoryEvent> {
        self.events_tx.clone()
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    pub fn registered_devices(&self) -> Vec<DeviceId> {
        lock(&self.registered_devices).clone()
    }

    pub fn registered_apps(&self) -> Vec<CompanionApp> {
        lock(&self.registered_apps).clone()
    }

    pub fn selection_requests(&self) -> usize {
        self.selection_requests.load(Ordering::SeqCst)
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AccessoryTransportPort for LoopbackTransport {
    async fn show_device_selection(&self) -> Result<(), TransportError> {
        self.selection_requests.fetch_add(1, Ordering::SeqCst);
        info!("Device selection requested, waiting for a selection response");
        Ok(())
    }

    fn parse_device_selection(&self, payload: &str) -> Vec<Device> {
        match serde_json::from_str::<Vec<Device>>(payload.trim()) {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "Unparseable selection response");
                Vec::new()
            }
        }
    }

    async fn register_device_events(&self, device: &Device) -> Result<(), TransportError> {
        let mut registered = lock(&self.registered_devices);
        if !registered.contains(&device.id) {
            registered.push(device.id);
        }
        debug!(device_id = %device.id, "Registered for device events");
        Ok(())
    }

    async fn register_app_messages(&self, app: &CompanionApp) -> Result<(), TransportError> {
        let mut registered = lock(&self.registered_apps);
        if !registered.contains(app) {
            registered.push(app.clone());
        }
        debug!(device_id = %app.device.id, app = app.kind.as_str(), "Registered for app messages");
        Ok(())
    }

    async fn app_status(&self, app: &CompanionApp) -> Result<AppInstallStatus, TransportError> {
        if !lock(&self.registered_devices).contains(&app.device.id) {
            return Err(TransportError::Unavailable(format!(
                "device {} is not registered",
                app.device.id
            )));
        }
        Ok(self
            .install_status
            .get(&app.kind)
            .copied()
            .unwrap_or(AppInstallStatus::Installed))
    }

    async fn send_message(
        &self,
        app: &CompanionApp,
        message: &Value,
        progress: &dyn SendProgress,
    ) -> Result<(), TransportError> {
        let total = message.to_string().len() as u64;
        progress.on_progress(0, total);
        info!(
            device_id = %app.device.id,
            app = app.kind.as_str(),
            message = %message,
            "Loopback message"
        );
        lock(&self.sent).push(SentMessage {
            app: app.clone(),
            message: message.clone(),
        });
        progress.on_progress(total, total);
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<mpsc::Receiver<AccessoryEvent>, TransportError> {
        lock(&self.events_rx)
            .take()
            .ok_or_else(|| TransportError::Other("events already subscribed".into()))
    }
}
