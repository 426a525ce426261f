//! LoopWatch Application Orchestration Layer
//!
//! Device session handling and watch state synchronization: the device
//! registry, the pairing flow, state aggregation, the throttled publisher
//! and dispatch to companion apps, plus the `WatchSyncService` facade the
//! host plugin calls into.
//!
//! ```text
//! telemetry ─▶ StateAggregator ─▶ ThrottledPublisher ─▶ MessageDispatcher ─▶ transport
//! pairing   ─▶ PairingSession  ─▶ DeviceRegistry (persist + re-register)
//! transport ─▶ InboundEventBridge ─▶ ThrottledPublisher
//! ```

pub mod deps;
pub mod service;
pub mod settings;
pub mod usecases;

pub use deps::WatchSyncDeps;
pub use service::{SyncError, WatchSyncService, DOSING_DECISION_DATA_LIMIT, GLUCOSE_DATA_LIMIT};
pub use settings::{ConfigError, SyncSettings};
