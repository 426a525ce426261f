use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::device::{CompanionApp, Device, DeviceStatus};

/// Accessory transport errors.
///
/// 配件传输层错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The SDK has not been initialized (or failed to initialize).
    #[error("accessory transport not initialized")]
    NotInitialized,

    /// The device or the radio link is not reachable right now.
    #[error("accessory unavailable: {0}")]
    Unavailable(String),

    /// The accessory side refused the request.
    #[error("accessory rejected request: {0}")]
    Rejected(String),

    #[error("accessory transport failed: {0}")]
    Other(String),
}

/// Install state of a companion app on its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppInstallStatus {
    Installed,
    NotInstalled,
}

impl AppInstallStatus {
    pub fn is_installed(&self) -> bool {
        matches!(self, AppInstallStatus::Installed)
    }
}

/// Events pushed by the transport.
#[derive(Debug, Clone)]
pub enum AccessoryEvent {
    DeviceStatusChanged {
        device: Device,
        status: DeviceStatus,
    },
    MessageReceived {
        payload: Value,
        app: CompanionApp,
    },
}

/// Observer for the transfer progress of one message.
pub trait SendProgress: Send + Sync {
    fn on_progress(&self, sent_bytes: u64, total_bytes: u64);
}

/// Accessory link supplied by the host (vendor SDK wrapper).
///
/// The core holds exactly one of these and never talks to the SDK directly.
///
/// 宿主提供的配件链路；核心只通过该端口访问 SDK。
#[async_trait]
pub trait AccessoryTransportPort: Send + Sync {
    /// Open the accessory companion's device-selection UI.
    ///
    /// The result arrives later, out of band, as a selection-response payload.
    async fn show_device_selection(&self) -> Result<(), TransportError>;

    /// Parse a selection-response payload (for example a deep-link URL).
    ///
    /// A payload that cannot be parsed yields an empty list.
    fn parse_device_selection(&self, payload: &str) -> Vec<Device>;

    /// Subscribe `device` to status-change events.
    async fn register_device_events(&self, device: &Device) -> Result<(), TransportError>;

    /// Subscribe `app` to inbound app messages.
    async fn register_app_messages(&self, app: &CompanionApp) -> Result<(), TransportError>;

    /// Ask the device whether `app` is installed.
    async fn app_status(&self, app: &CompanionApp) -> Result<AppInstallStatus, TransportError>;

    /// Send one message to `app`, reporting progress along the way.
    ///
    /// `Ok(())` means the accessory acknowledged delivery.
    async fn send_message(
        &self,
        app: &CompanionApp,
        message: &Value,
        progress: &dyn SendProgress,
    ) -> Result<(), TransportError>;

    /// Receive status-change and inbound-message events.
    async fn subscribe_events(&self) -> Result<mpsc::Receiver<AccessoryEvent>, TransportError>;
}
