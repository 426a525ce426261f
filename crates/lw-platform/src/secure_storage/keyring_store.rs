use keyring::Entry;
use lw_core::ports::{SecretStoreError, SecretStorePort};

/// Keyring service name the device set is filed under.
pub const SERVICE_NAME: &str = "loopwatch";

trait KeyringEntryOps {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error>;
    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error>;
    fn delete_credential(&self) -> Result<(), keyring::Error>;
}

trait KeyringBackend {
    type Entry: KeyringEntryOps;
    fn new_entry(&self, service: &str, username: &str) -> Result<Self::Entry, keyring::Error>;
}

struct RealBackend;

struct RealEntry {
    inner: Entry,
}

impl KeyringEntryOps for RealEntry {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error> {
        self.inner.get_secret()
    }

    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error> {
        self.inner.set_secret(secret)
    }

    fn delete_credential(&self) -> Result<(), keyring::Error> {
        self.inner.delete_credential()
    }
}

impl KeyringBackend for RealBackend {
    type Entry = RealEntry;

    fn new_entry(&self, service: &str, username: &str) -> Result<Self::Entry, keyring::Error> {
        Entry::new(service, username).map(|inner| RealEntry { inner })
    }
}

fn map_keyring_error(context: &str, err: keyring::Error) -> SecretStoreError {
    match err {
        keyring::Error::NoStorageAccess(inner) => {
            SecretStoreError::Unavailable(format!("{context}: {inner}"))
        }
        keyring::Error::PlatformFailure(inner) => {
            SecretStoreError::PermissionDenied(format!("{context}: {inner}"))
        }
        keyring::Error::BadEncoding(_) => {
            SecretStoreError::Corrupt(format!("{context}: stored secret is not valid"))
        }
        err => SecretStoreError::Other(format!("{context}: {err}")),
    }
}

fn open_entry<B: KeyringBackend>(
    backend: &B,
    service: &str,
    key: &str,
) -> Result<B::Entry, SecretStoreError> {
    backend
        .new_entry(service, key)
        .map_err(|e| map_keyring_error("failed to access keyring entry", e))
}

fn get_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    key: &str,
) -> Result<Option<Vec<u8>>, SecretStoreError> {
    let entry = open_entry(backend, service, key)?;
    match entry.get_secret() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(map_keyring_error("failed to read keyring", e)),
    }
}

fn set_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    key: &str,
    value: &[u8],
) -> Result<(), SecretStoreError> {
    let entry = open_entry(backend, service, key)?;
    entry
        .set_secret(value)
        .map_err(|e| map_keyring_error("failed to write keyring", e))
}

fn delete_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    key: &str,
) -> Result<(), SecretStoreError> {
    let entry = open_entry(backend, service, key)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(map_keyring_error("failed to delete keyring entry", e)),
    }
}

/// OS keyring-backed secret store.
///
/// 基于系统钥匙串的安全存储实现。
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStorePort for KeyringSecretStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        get_with_backend(&RealBackend, &self.service, key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
        set_with_backend(&RealBackend, &self.service, key, value)
    }

    fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        delete_with_backend(&RealBackend, &self.service, key)
    }
}
