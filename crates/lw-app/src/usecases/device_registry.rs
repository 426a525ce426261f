//! Paired device registry.
//!
//! Owns the device set, persists it as one JSON secret and keeps the
//! transport registrations in step with it.
//! 已配对设备注册表：持久化设备集合，并在变更时重新注册事件。

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, info_span, warn, Instrument};

use lw_core::ports::{AccessoryTransportPort, SecretStoreError, SecretStorePort};
use lw_core::{CompanionApp, Device};

/// Secret name under which the device set is stored.
pub const DEVICES_SECRET_KEY: &str = "LoopWatchDevices";

#[derive(Default)]
struct RegistryState {
    devices: Vec<Device>,
    apps: Vec<CompanionApp>,
}

pub struct DeviceRegistry {
    secret_store: Arc<dyn SecretStorePort>,
    transport: Arc<dyn AccessoryTransportPort>,
    state: RwLock<RegistryState>,
}

impl DeviceRegistry {
    /// Create an empty registry. Call [`DeviceRegistry::restore`] to load the
    /// persisted devices.
    pub fn new(
        secret_store: Arc<dyn SecretStorePort>,
        transport: Arc<dyn AccessoryTransportPort>,
    ) -> Self {
        Self {
            secret_store,
            transport,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Current devices, in selection order.
    pub async fn devices(&self) -> Vec<Device> {
        self.state.read().await.devices.clone()
    }

    /// Companion apps for the current devices (two per device).
    pub async fn companion_apps(&self) -> Vec<CompanionApp> {
        self.state.read().await.apps.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.devices.is_empty()
    }

    /// Replace the whole device set.
    ///
    /// Persists the new set, regenerates the companion apps and re-registers
    /// every device and app with the transport. Persistence and registration
    /// failures are logged; the in-memory set is replaced regardless.
    pub async fn replace_devices(&self, devices: Vec<Device>) {
        let span = info_span!("usecase.device_registry.replace", device_count = devices.len());

        async {
            let mut state = self.state.write().await;

            self.persist(&devices);

            let apps = CompanionApp::for_devices(&devices);
            for device in &devices {
                if let Err(err) = self.transport.register_device_events(device).await {
                    warn!(device_id = %device.id, error = %err, "Failed to register device events");
                }
            }
            for app in &apps {
                if let Err(err) = self.transport.register_app_messages(app).await {
                    warn!(
                        device_id = %app.device.id,
                        app = app.kind.as_str(),
                        error = %err,
                        "Failed to register app messages"
                    );
                }
            }

            info!(app_count = apps.len(), "Paired device set replaced");
            state.devices = devices;
            state.apps = apps;
        }
        .instrument(span)
        .await
    }

    /// Load the persisted device set.
    ///
    /// A blob that does not decode is overwritten with an empty value and the
    /// registry stays empty; nothing is retried.
    pub async fn restore(&self) -> Vec<Device> {
        let span = info_span!("usecase.device_registry.restore");

        async {
            let bytes = match self.secret_store.get(DEVICES_SECRET_KEY) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!("No paired devices persisted yet");
                    return Vec::new();
                }
                Err(SecretStoreError::Corrupt(msg)) => {
                    warn!(error = %msg, "Persisted devices unreadable, resetting");
                    self.reset_persisted();
                    return Vec::new();
                }
                Err(err) => {
                    warn!(error = %err, "Secret store unavailable, starting without devices");
                    return Vec::new();
                }
            };

            if bytes.iter().all(u8::is_ascii_whitespace) {
                debug!("Persisted device set is empty");
                return Vec::new();
            }

            match serde_json::from_slice::<Vec<Device>>(&bytes) {
                Ok(devices) => {
                    info!(device_count = devices.len(), "Restored paired devices");
                    self.replace_devices(devices.clone()).await;
                    devices
                }
                Err(err) => {
                    warn!(error = %err, "Failed to decode persisted devices, resetting");
                    self.reset_persisted();
                    Vec::new()
                }
            }
        }
        .instrument(span)
        .await
    }

    fn persist(&self, devices: &[Device]) {
        let bytes = match serde_json::to_vec(devices) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "Failed to encode device set, keeping previous value");
                return;
            }
        };
        if let Err(err) = self.secret_store.set(DEVICES_SECRET_KEY, &bytes) {
            warn!(error = %err, "Failed to persist device set");
        }
    }

    fn reset_persisted(&self) {
        if let Err(err) = self.secret_store.set(DEVICES_SECRET_KEY, b"") {
            warn!(error = %err, "Failed to reset persisted device set");
        }
    }
}
