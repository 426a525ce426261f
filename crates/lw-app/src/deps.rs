//! # Application Dependencies / 应用依赖
//!
//! Parameter grouping for `WatchSyncService` construction. Not a builder:
//! no defaults, no hidden logic.
//! 仅用于参数打包，不是 Builder 模式。

use std::sync::Arc;

use lw_core::ports::{AccessoryTransportPort, SecretStorePort};

/// Ports required by the synchronization core.
pub struct WatchSyncDeps {
    /// Persists the paired device set.
    pub secret_store: Arc<dyn SecretStorePort>,
    /// The accessory link (vendor SDK wrapper or loopback adapter).
    pub transport: Arc<dyn AccessoryTransportPort>,
}
