//! Port interfaces consumed by the application layer.
//!
//! Both ports are implemented outside the core: the secret store by the
//! platform crate, the transport by the host's accessory SDK wrapper (or the
//! loopback adapter when running headless).

pub mod accessory_transport;
pub mod secret_store;

pub use accessory_transport::{
    AccessoryEvent, AccessoryTransportPort, AppInstallStatus, SendProgress, TransportError,
};
pub use secret_store::{SecretStoreError, SecretStorePort};
