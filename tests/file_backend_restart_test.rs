use std::path::PathBuf;

use lw_core::{AppConfig, Device, DeviceId, SecretBackend};
use loopwatch_lib::bootstrap::wire_service;

fn file_config(secrets_dir: PathBuf) -> AppConfig {
    AppConfig {
        secret_backend: SecretBackend::File,
        secrets_dir,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn paired_devices_survive_restart_with_file_backend() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = file_config(temp_dir.path().join("secrets"));
    let devices = vec![
        Device::new(DeviceId::random(), "fenix 7", "Run watch"),
        Device::new(DeviceId::random(), "venu 2", "Day watch"),
    ];

    let first = wire_service(&config).await.unwrap();
    first
        .service
        .handle_selection_response(&serde_json::to_string(&devices).unwrap())
        .await;
    first.service.shutdown();

    let second = wire_service(&config).await.unwrap();
    assert_eq!(second.service.list_devices().await, devices);
    assert!(second.service.has_configuration().await);
    assert_eq!(second.transport.registered_devices().len(), 2);
    assert_eq!(second.transport.registered_apps().len(), 4);

    second.service.forget_devices().await;
    second.service.shutdown();

    let third = wire_service(&config).await.unwrap();
    assert!(third.service.list_devices().await.is_empty());
    third.service.shutdown();
}

#[tokio::test]
async fn corrupt_device_file_is_reset_on_start() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let secrets_dir = temp_dir.path().join("secrets");
    std::fs::create_dir_all(&secrets_dir).unwrap();
    std::fs::write(secrets_dir.join("LoopWatchDevices.secret"), b"{not json").unwrap();

    let wired = wire_service(&file_config(secrets_dir.clone())).await.unwrap();

    assert!(wired.service.list_devices().await.is_empty());
    let reset = std::fs::read(secrets_dir.join("LoopWatchDevices.secret")).unwrap();
    assert!(reset.is_empty());
    wired.service.shutdown();
}
