use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lw_app::usecases::DEVICES_SECRET_KEY;
use lw_app::{SyncError, SyncSettings, WatchSyncDeps, WatchSyncService};
use lw_core::ports::{
    AccessoryEvent, AccessoryTransportPort, AppInstallStatus, SecretStoreError, SecretStorePort,
    SendProgress, TransportError,
};
use lw_core::{
    CompanionApp, CompanionAppKind, Device, DeviceId, DeviceStatus, DosingDecision,
    GlucoseSample, GlucoseTrend, GlucoseValue,
};

#[derive(Clone)]
struct SharedLogBuffer {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter {
            buffer: self.buffer.clone(),
        }
    }
}

struct SharedLogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.buffer.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

static LOG_BUFFER: OnceLock<Arc<Mutex<Vec<u8>>>> = OnceLock::new();

fn init_test_tracing() -> Arc<Mutex<Vec<u8>>> {
    LOG_BUFFER
        .get_or_init(|| {
            let buffer = Arc::new(Mutex::new(Vec::new()));
            let writer = SharedLogBuffer {
                buffer: buffer.clone(),
            };
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .with_env_filter(EnvFilter::new("warn"))
                .with_writer(writer)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .expect("set global tracing subscriber");
            buffer
        })
        .clone()
}

#[derive(Default)]
struct InMemorySecretStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemorySecretStore {
    fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl SecretStorePort for InMemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Accessory stand-in: selection payloads are JSON device arrays, sends are
/// recorded, and inbound events are injected through `events`.
struct FakeAccessory {
    failing: Option<CompanionAppKind>,
    sent: Mutex<Vec<(CompanionApp, Value)>>,
    registered: Mutex<Vec<DeviceId>>,
    events_tx: mpsc::Sender<AccessoryEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<AccessoryEvent>>>,
}

impl FakeAccessory {
    fn new(failing: Option<CompanionAppKind>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(8);
        Self {
            failing,
            sent: Mutex::new(Vec::new()),
            registered: Mutex::new(Vec::new()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    fn sent(&self) -> Vec<(CompanionApp, Value)> {
        self.sent.lock().unwrap().clone()
    }

    fn registered(&self) -> Vec<DeviceId> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccessoryTransportPort for FakeAccessory {
    async fn show_device_selection(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn parse_device_selection(&self, payload: &str) -> Vec<Device> {
        serde_json::from_str(payload).unwrap_or_default()
    }

    async fn register_device_events(&self, device: &Device) -> Result<(), TransportError> {
        self.registered.lock().unwrap().push(device.id);
        Ok(())
    }

    async fn register_app_messages(&self, _app: &CompanionApp) -> Result<(), TransportError> {
        Ok(())
    }

    async fn app_status(&self, _app: &CompanionApp) -> Result<AppInstallStatus, TransportError> {
        Ok(AppInstallStatus::Installed)
    }

    async fn send_message(
        &self,
        app: &CompanionApp,
        message: &Value,
        progress: &dyn SendProgress,
    ) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((app.clone(), message.clone()));
        if self.failing == Some(app.kind) {
            return Err(TransportError::Rejected("watch app busy".into()));
        }
        progress.on_progress(1, 1);
        Ok(())
    }

    async fn subscribe_events(&self) -> Result<mpsc::Receiver<AccessoryEvent>, TransportError> {
        self.events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TransportError::Other("already subscribed".into()))
    }
}

struct Harness {
    service: Arc<WatchSyncService>,
    store: Arc<InMemorySecretStore>,
    accessory: Arc<FakeAccessory>,
}

async fn start(store: InMemorySecretStore, accessory: FakeAccessory) -> Harness {
    let store = Arc::new(store);
    let accessory = Arc::new(accessory);
    let service = WatchSyncService::start(
        WatchSyncDeps {
            secret_store: store.clone(),
            transport: accessory.clone(),
        },
        SyncSettings::default(),
    )
    .await;
    Harness {
        service: Arc::new(service),
        store,
        accessory,
    }
}

fn fenix() -> Device {
    Device::new(
        DeviceId::new(Uuid::from_u128(0x1f2e_3d4c)),
        "fenix 7",
        "Morning watch",
    )
}

fn store_with(devices: &[Device]) -> Result<InMemorySecretStore> {
    let store = InMemorySecretStore::default();
    let blob = serde_json::to_vec(devices).context("encode devices")?;
    store.set(DEVICES_SECRET_KEY, &blob)?;
    Ok(store)
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 2, 7, minute, 0).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_service_accepts_uploads_without_sending() -> Result<()> {
    let harness = start(InMemorySecretStore::default(), FakeAccessory::new(None)).await;

    assert!(!harness.service.has_configuration().await);
    assert_eq!(
        harness.service.verify_configuration().await,
        Err(SyncError::MissingCredentials)
    );
    assert!(
        harness
            .service
            .upload_glucose_data(&[GlucoseSample::new(at(5), 110.0, None)])
            .await
    );

    sleep(Duration::from_secs(30)).await;
    assert!(harness.accessory.sent().is_empty());
    assert!(harness.store.value(DEVICES_SECRET_KEY).is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_restored_devices_receive_one_coalesced_snapshot() -> Result<()> {
    let harness = start(store_with(&[fenix()])?, FakeAccessory::new(None)).await;
    assert_eq!(harness.service.list_devices().await, vec![fenix()]);
    assert_eq!(harness.accessory.registered(), vec![fenix().id]);
    harness.service.verify_configuration().await?;

    // Only the newest two samples count: delta is 142 - 138.
    let samples = [
        GlucoseSample::new(at(10), 142.0, Some(GlucoseTrend::UpUpUp)),
        GlucoseSample::new(at(5), 138.0, None),
        GlucoseSample::new(at(0), 90.0, None),
    ];
    assert!(harness.service.upload_glucose_data(&samples).await);

    let mut older = DosingDecision::new(at(9));
    older.insulin_on_board = Some(9.9);
    let mut newest = DosingDecision::new(at(11));
    newest.insulin_on_board = Some(1.25);
    newest.predicted_glucose = vec![
        GlucoseValue {
            start_date: at(15),
            mg_dl: 150.0,
        },
        GlucoseValue {
            start_date: at(40),
            mg_dl: 171.4,
        },
    ];
    assert!(
        harness
            .service
            .upload_dosing_decision_data(&[older, newest])
            .await
    );
    assert!(harness.service.has_pending_delivery());

    sleep(Duration::from_secs(9)).await;
    assert!(harness.accessory.sent().is_empty());

    sleep(Duration::from_secs(2)).await;
    let sent = harness.accessory.sent();
    assert_eq!(sent.len(), 2);
    let kinds: Vec<_> = sent.iter().map(|(app, _)| app.kind).collect();
    assert!(kinds.contains(&CompanionAppKind::Watchface));
    assert!(kinds.contains(&CompanionAppKind::DataField));

    let message = &sent[0].1;
    assert_eq!(message["glucose"], "142");
    assert_eq!(message["delta"], "+4");
    assert_eq!(message["trend"], "⇈");
    assert_eq!(message["trendRaw"], "1");
    assert_eq!(message["iob"], 1.25);
    assert_eq!(message["cob"], 0.0);
    assert_eq!(message["eventualBGRaw"], "171");
    assert!(message.get("bolusAfterCarbs").is_none());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.accessory.sent().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_selection_response_pairs_and_persists_devices() -> Result<()> {
    let harness = start(InMemorySecretStore::default(), FakeAccessory::new(None)).await;
    let payload = serde_json::to_string(&vec![fenix()])?;

    let waiter = tokio::spawn({
        let service = harness.service.clone();
        async move { service.select_devices().await }
    });
    sleep(Duration::from_secs(3)).await;

    let parsed = harness.service.handle_selection_response(&payload).await;
    let resolved = waiter.await??;

    assert_eq!(parsed, vec![fenix()]);
    assert_eq!(resolved, vec![fenix()]);
    assert!(harness.service.has_configuration().await);
    assert_eq!(harness.service.companion_apps().await.len(), 2);

    let persisted = harness
        .store
        .value(DEVICES_SECRET_KEY)
        .context("device set persisted")?;
    let persisted: Vec<Device> = serde_json::from_slice(&persisted)?;
    assert_eq!(persisted, vec![fenix()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_selection_without_response_returns_empty_after_timeout() -> Result<()> {
    let harness = start(InMemorySecretStore::default(), FakeAccessory::new(None)).await;
    let started = tokio::time::Instant::now();

    let devices = harness.service.select_devices().await?;

    assert!(devices.is_empty());
    assert_eq!(started.elapsed(), Duration::from_secs(120));
    assert!(!harness.service.has_configuration().await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_status_request_republishes_through_event_loop() -> Result<()> {
    let harness = start(store_with(&[fenix()])?, FakeAccessory::new(None)).await;
    harness
        .service
        .upload_glucose_data(&[GlucoseSample::new(at(20), 101.0, None)])
        .await;
    sleep(Duration::from_secs(11)).await;
    assert_eq!(harness.accessory.sent().len(), 2);

    harness.service.set_state_provider(harness.service.aggregator());
    let event_loop = harness
        .service
        .spawn_event_loop()
        .await
        .context("event loop started")?;

    let app = CompanionApp::new(CompanionAppKind::Watchface, fenix());
    harness
        .accessory
        .events_tx
        .send(AccessoryEvent::DeviceStatusChanged {
            device: fenix(),
            status: DeviceStatus::Connected,
        })
        .await?;
    harness
        .accessory
        .events_tx
        .send(AccessoryEvent::MessageReceived {
            payload: Value::from("status"),
            app,
        })
        .await?;

    sleep(Duration::from_secs(11)).await;
    let sent = harness.accessory.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[3].1["glucose"], "101");

    event_loop.abort();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_status_request_without_provider_sends_nothing() -> Result<()> {
    let harness = start(store_with(&[fenix()])?, FakeAccessory::new(None)).await;
    let app = CompanionApp::new(CompanionAppKind::DataField, fenix());

    harness
        .service
        .handle_app_message(&Value::from("status"), &app)
        .await;

    sleep(Duration::from_secs(25)).await;
    assert!(harness.accessory.sent().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_forget_devices_persists_empty_set() -> Result<()> {
    let harness = start(store_with(&[fenix()])?, FakeAccessory::new(None)).await;

    harness.service.forget_devices().await;

    assert!(!harness.service.has_configuration().await);
    assert_eq!(harness.store.value(DEVICES_SECRET_KEY), Some(b"[]".to_vec()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_send_is_logged_and_other_app_still_served() -> Result<()> {
    let logs = init_test_tracing();
    let harness = start(
        store_with(&[fenix()])?,
        FakeAccessory::new(Some(CompanionAppKind::DataField)),
    )
    .await;

    harness
        .service
        .upload_glucose_data(&[GlucoseSample::new(at(30), 77.0, None)])
        .await;
    sleep(Duration::from_secs(11)).await;

    assert_eq!(harness.accessory.sent().len(), 2);
    let output = String::from_utf8(logs.lock().unwrap().clone())?;
    assert!(output.contains("Message failed"));
    assert!(output.contains("watch app busy"));

    // No retry on the next interval.
    sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.accessory.sent().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_pending_snapshot() -> Result<()> {
    let harness = start(store_with(&[fenix()])?, FakeAccessory::new(None)).await;

    harness
        .service
        .upload_glucose_data(&[GlucoseSample::new(at(40), 180.0, None)])
        .await;
    harness.service.shutdown();

    sleep(Duration::from_secs(30)).await;
    assert!(harness.accessory.sent().is_empty());
    Ok(())
}
