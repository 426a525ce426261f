//! # Dependency Injection / 依赖注入模块
//!
//! The only place that depends on lw-app and lw-platform at once. It
//! assembles; it does not decide.
//! 这是唯一同时依赖 lw-app 与 lw-platform 的地方，仅用于组装。

use std::sync::Arc;

use lw_app::{ConfigError, SyncSettings, WatchSyncDeps, WatchSyncService};
use lw_core::config::AppConfig;
use lw_platform::{create_secret_store, LoopbackTransport, SecretStoreFactoryError};
use tracing::info;

/// Errors during dependency injection
/// 依赖注入错误
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("invalid settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("secret store initialization failed: {0}")]
    SecretStore(#[from] SecretStoreFactoryError),
}

/// The running service plus the concrete loopback link, kept so the CLI
/// can inspect what was sent.
pub struct WiredService {
    pub service: WatchSyncService,
    pub transport: Arc<LoopbackTransport>,
    pub settings: SyncSettings,
}

/// Build the service from configuration, restoring the paired devices.
///
/// The aggregator is registered as the status-request provider.
pub async fn wire_service(config: &AppConfig) -> Result<WiredService, WiringError> {
    let settings = SyncSettings::try_from(config)?;
    let secret_store = create_secret_store(&config.secret_backend, &config.secrets_dir)?;
    let transport = Arc::new(LoopbackTransport::new());

    let service = WatchSyncService::start(
        WatchSyncDeps {
            secret_store,
            transport: transport.clone(),
        },
        settings,
    )
    .await;
    service.set_state_provider(service.aggregator());

    info!(backend = ?config.secret_backend, "Service wired");
    Ok(WiredService {
        service,
        transport,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_core::SecretBackend;

    fn memory_config() -> AppConfig {
        AppConfig {
            secret_backend: SecretBackend::Memory,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_wires_with_memory_backend() {
        let wired = wire_service(&memory_config()).await.unwrap();

        assert!(!wired.service.has_configuration().await);
        assert_eq!(wired.settings, SyncSettings::default());
        wired.service.shutdown();
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let config = AppConfig {
            throttle_interval_secs: 0,
            ..memory_config()
        };

        assert!(matches!(
            wire_service(&config).await,
            Err(WiringError::Settings(ConfigError::ZeroDuration(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let config = AppConfig {
            secret_backend: SecretBackend::Other("vault".into()),
            ..AppConfig::default()
        };

        assert!(matches!(
            wire_service(&config).await,
            Err(WiringError::SecretStore(SecretStoreFactoryError::UnknownBackend(_)))
        ));
    }
}
