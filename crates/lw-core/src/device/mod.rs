//! Paired accessory devices and the companion apps running on them.

mod companion_app;
mod status;

pub use companion_app::{CompanionApp, CompanionAppKind};
pub use status::DeviceStatus;

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::ids::DeviceId;

/// A paired accessory.
///
/// Immutable once created; the registry replaces its whole device set instead
/// of editing entries. Two devices are equal when their ids are equal.
///
/// The serde representation is the persisted record
/// `{ "id", "modelName", "friendlyName" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub model_name: String,
    pub friendly_name: String,
}

impl Device {
    pub fn new(
        id: DeviceId,
        model_name: impl Into<String>,
        friendly_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            model_name: model_name.into(),
            friendly_name: friendly_name.into(),
        }
    }

    /// Name to show in device lists; falls back to the model name when the
    /// accessory did not report a friendly name.
    pub fn display_name(&self) -> &str {
        if self.friendly_name.trim().is_empty() {
            &self.model_name
        } else {
            &self.friendly_name
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
