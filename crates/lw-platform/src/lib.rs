//! # lw-platform
//!
//! Platform implementations for LoopWatch.
//!
//! This crate contains the adapters behind the core ports: secret stores
//! backed by the OS keyring, plain files or memory, and the loopback
//! accessory transport used when no vendor SDK is linked in.

pub mod adapters;
pub mod secure_storage;

pub use adapters::LoopbackTransport;
pub use secure_storage::{
    create_secret_store, FileSecretStore, InMemorySecretStore, KeyringSecretStore,
    SecretStoreFactoryError,
};
