//! # lw-core
//!
//! Core domain models and ports for LoopWatch.
//!
//! This crate holds the pure parts of the watch synchronization: devices and
//! their companion apps, telemetry records, the canonical `WatchState` with
//! its formatting and merge rules, and the ports the application layer is
//! wired against. It performs no I/O.

pub mod config;
pub mod device;
pub mod ids;
pub mod ports;
pub mod state;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use config::{AppConfig, SecretBackend};
pub use device::{CompanionApp, CompanionAppKind, Device, DeviceStatus};
pub use ids::DeviceId;
pub use state::{GlucoseMerge, WatchState};
pub use telemetry::{DosingDecision, GlucoseSample, GlucoseTrend, GlucoseValue};
