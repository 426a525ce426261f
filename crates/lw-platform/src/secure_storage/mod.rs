//! Secret store selection.

mod file_store;
mod keyring_store;
mod memory_store;

use std::path::{Path, PathBuf};
use std::{fs, io, sync::Arc};

use lw_core::ports::SecretStorePort;
use lw_core::SecretBackend;
use tracing::{debug, info, warn};

pub use file_store::FileSecretStore;
pub use keyring_store::{KeyringSecretStore, SERVICE_NAME};
pub use memory_store::InMemorySecretStore;

/// Directory name under the platform data dir.
const APP_DIR_NAME: &str = "loopwatch";

#[derive(Debug, thiserror::Error)]
pub enum SecretStoreFactoryError {
    #[error("unknown secret backend: {0}")]
    UnknownBackend(String),

    #[error("no platform data directory, set storage.secrets_dir")]
    NoDataDir,

    #[error("failed to initialize file secret store: {0}")]
    FileInit(#[from] io::Error),
}

/// Build the configured secret store.
///
/// `secrets_dir` only matters for the file backend; when empty the platform
/// data directory is used.
pub fn create_secret_store(
    backend: &SecretBackend,
    secrets_dir: &Path,
) -> Result<Arc<dyn SecretStorePort>, SecretStoreFactoryError> {
    debug!(?backend, "Selecting secret store");

    match backend {
        SecretBackend::Keyring => {
            info!(service = SERVICE_NAME, "Using system keyring for paired devices");
            Ok(Arc::new(KeyringSecretStore::new()) as Arc<dyn SecretStorePort>)
        }
        SecretBackend::File => {
            let store = if secrets_dir.as_os_str().is_empty() {
                FileSecretStore::new_in_data_root(&default_data_root()?)?
            } else {
                fs::create_dir_all(secrets_dir)?;
                FileSecretStore::with_base_dir(secrets_dir.to_path_buf())
            };
            warn!(
                dir = %store.base_dir().display(),
                "Using file secret store (plain files, owner-only)"
            );
            Ok(Arc::new(store) as Arc<dyn SecretStorePort>)
        }
        SecretBackend::Memory => {
            warn!("Using in-memory secret store, paired devices are not persisted");
            Ok(Arc::new(InMemorySecretStore::new()) as Arc<dyn SecretStorePort>)
        }
        SecretBackend::Other(name) => Err(SecretStoreFactoryError::UnknownBackend(name.clone())),
    }
}

fn default_data_root() -> Result<PathBuf, SecretStoreFactoryError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(SecretStoreFactoryError::NoDataDir)
}
