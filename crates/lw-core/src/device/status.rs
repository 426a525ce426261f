use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Connection status reported by the accessory transport for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceStatus {
    Invalid,
    BluetoothNotReady,
    NotFound,
    NotConnected,
    Connected,
    Unknown,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Invalid => "invalid",
            DeviceStatus::BluetoothNotReady => "bluetoothNotReady",
            DeviceStatus::NotFound => "notFound",
            DeviceStatus::NotConnected => "notConnected",
            DeviceStatus::Connected => "connected",
            DeviceStatus::Unknown => "unknown",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, DeviceStatus::Connected)
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
