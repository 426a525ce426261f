//! Shared fakes for use-case unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use lw_core::ports::{
    AccessoryEvent, AccessoryTransportPort, AppInstallStatus, SecretStoreError, SecretStorePort,
    SendProgress, TransportError,
};
use lw_core::{CompanionApp, CompanionAppKind, Device, DeviceId};

pub fn device(model: &str) -> Device {
    Device::new(DeviceId::random(), model, format!("{model} watch"))
}

#[derive(Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySecretStore {
    pub fn put(&self, key: &str, value: &[u8]) {
        self.values
            .lock()
            .expect("values lock")
            .insert(key.to_string(), value.to_vec());
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().expect("values lock").get(key).cloned()
    }
}

impl SecretStorePort for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
        self.put(key, value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        self.values.lock().expect("values lock").remove(key);
        Ok(())
    }
}

/// Transport fake that records every call.
///
/// Selection payloads are JSON arrays of device records. All apps report as
/// installed unless listed in `not_installed`; sends fail for kinds listed in
/// `failing_sends`.
#[derive(Default)]
pub struct RecordingTransport {
    pub selection_calls: AtomicUsize,
    pub fail_selection: bool,
    pub not_installed: HashSet<CompanionAppKind>,
    pub failing_sends: HashSet<CompanionAppKind>,
    pub devices: Mutex<Vec<Device>>,
    pub apps: Mutex<Vec<CompanionApp>>,
    pub sent: Mutex<Vec<(CompanionApp, Value)>>,
}

impl RecordingTransport {
    pub fn registered_devices(&self) -> Vec<Device> {
        self.devices.lock().expect("devices lock").clone()
    }

    pub fn registered_apps(&self) -> Vec<CompanionApp> {
        self.apps.lock().expect("apps lock").clone()
    }

    pub fn sent(&self) -> Vec<(CompanionApp, Value)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn selection_calls(&self) -> usize {
        self.selection_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessoryTransportPort for RecordingTransport {
    async fn show_device_selection(&self) -> Result<(), TransportError> {
        self.selection_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_selection {
            return Err(TransportError::NotInitialized);
        }
        Ok(())
    }

    fn parse_device_selection(&self, payload: &str) -> Vec<Device> {
        serde_json::from_str(payload).unwrap_or_default()
    }

    async fn register_device_events(&self, device: &Device) -> Result<(), TransportError> {
        self.devices
            .lock()
            .expect("devices lock")
            .push(device.clone());
        Ok(())
    }

    async fn register_app_messages(&self, app: &CompanionApp) -> Result<(), TransportError> {
        self.apps.lock().expect("apps lock").push(app.clone());
        Ok(())
    }

    async fn app_status(&self, app: &CompanionApp) -> Result<AppInstallStatus, TransportError> {
        if self.not_installed.contains(&app.kind) {
            Ok(AppInstallStatus::NotInstalled)
        } else {
            Ok(AppInstallStatus::Installed)
        }
    }

    async fn send_message(
        &self,
        app: &CompanionApp,
        message: &Value,
        progress: &dyn SendProgress,
    ) -> Result<(), TransportError> {
        progress.on_progress(0, 1);
        self.sent
            .lock()
            .expect("sent lock")
            .push((app.clone(), message.clone()));
        if self.failing_sends.contains(&app.kind) {
            return Err(TransportError::Unavailable("device out of range".into()));
        }
        progress.on_progress(1, 1);
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<mpsc::Receiver<AccessoryEvent>, TransportError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}
