//! Synchronization use cases
//!
//! [HealthStore / Loop]
//        ↓
// StateAggregator          ← glucose samples, dosing decisions
//        ↓
// ThrottledPublisher       ← latest value, one delivery per interval
//        ↓
// MessageDispatcher        → every installed companion app
// ---------------------------------
// PairingSession → DeviceRegistry → SecretStore + transport registrations
// InboundEventBridge ("status") → ThrottledPublisher

pub mod device_registry;
pub mod inbound_event_bridge;
pub mod message_dispatcher;
pub mod pairing_session;
pub mod state_aggregator;
pub mod throttled_publisher;

#[cfg(test)]
pub(crate) mod test_support;

pub use device_registry::{DeviceRegistry, DEVICES_SECRET_KEY};
pub use inbound_event_bridge::{InboundEventBridge, InboundOutcome, SnapshotProvider, STATUS_REQUEST};
pub use message_dispatcher::{Delivery, DispatchReport, MessageDispatcher};
pub use pairing_session::{PairingError, PairingSession};
pub use state_aggregator::StateAggregator;
pub use throttled_publisher::{SnapshotSink, ThrottledPublisher};
