use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

use super::Device;

/// The two companion applications installed on an accessory.
///
/// Their application ids are fixed; every paired device gets exactly one
/// registration per kind.
/// 每个已配对设备固定对应两个伴随应用：表盘和数据字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompanionAppKind {
    Watchface,
    DataField,
}

impl CompanionAppKind {
    pub const ALL: [CompanionAppKind; 2] = [CompanionAppKind::Watchface, CompanionAppKind::DataField];

    pub fn app_id(&self) -> Uuid {
        match self {
            CompanionAppKind::Watchface => uuid!("EC3420F6-027D-49B3-B45F-D81D6D3ED90B"),
            CompanionAppKind::DataField => uuid!("71CF0982-CA41-42A5-8441-EA81D36056C4"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanionAppKind::Watchface => "watchface",
            CompanionAppKind::DataField => "data field",
        }
    }
}

/// One companion app on one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanionApp {
    pub kind: CompanionAppKind,
    /// Install-store token handed to the transport along with the app id.
    pub store_token: Uuid,
    pub device: Device,
}

impl CompanionApp {
    pub fn new(kind: CompanionAppKind, device: Device) -> Self {
        Self {
            kind,
            store_token: Uuid::new_v4(),
            device,
        }
    }

    /// Both companion apps for `device`, in `CompanionAppKind::ALL` order.
    pub fn for_device(device: &Device) -> [CompanionApp; 2] {
        CompanionAppKind::ALL.map(|kind| CompanionApp::new(kind, device.clone()))
    }

    /// Companion apps for a whole device set: exactly `2 * devices.len()`.
    pub fn for_devices(devices: &[Device]) -> Vec<CompanionApp> {
        devices.iter().flat_map(CompanionApp::for_device).collect()
    }

    pub fn app_id(&self) -> Uuid {
        self.kind.app_id()
    }
}
