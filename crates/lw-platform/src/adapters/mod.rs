//! # Platform Adapters / 平台适配器
//!
//! - `loopback` - In-process accessory transport for headless runs and tests

pub mod loopback;

pub use loopback::{LoopbackTransport, SentMessage};
