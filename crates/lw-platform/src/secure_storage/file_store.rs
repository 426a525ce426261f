use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lw_core::ports::{SecretStoreError, SecretStorePort};

/// File-based secret store for headless machines without a keyring daemon.
///
/// 基于文件的安全存储（无桌面环境回退）。
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    base_dir: PathBuf,
}

impl FileSecretStore {
    /// Create the store rooted at `<data_root>/secrets`, creating the
    /// directory if needed.
    pub fn new_in_data_root(data_root: &Path) -> Result<Self, io::Error> {
        let base_dir = data_root.join("secrets");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{name}.secret"))
    }

    fn map_io_error(context: &str, err: io::Error) -> SecretStoreError {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                SecretStoreError::PermissionDenied(format!("{context}: {err}"))
            }
            _ => SecretStoreError::Other(format!("{context}: {err}")),
        }
    }
}

impl SecretStorePort for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SecretStoreError> {
        match fs::read(self.file_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::map_io_error("failed to read secret file", err)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
        let path = self.file_path(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)
            .map_err(|err| Self::map_io_error("failed to write secret temp file", err))?;
        fs::rename(&temp_path, &path)
            .map_err(|err| Self::map_io_error("failed to rename secret file", err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(|err| Self::map_io_error("failed to set secret file permissions", err))?;
        }

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::map_io_error("failed to delete secret file", err)),
        }
    }
}
