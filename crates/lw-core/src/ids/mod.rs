//! Identifier newtypes shared across the domain.

mod device_id;

pub use device_id::DeviceId;
