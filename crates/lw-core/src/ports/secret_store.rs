use thiserror::Error;

/// Secret store errors.
///
/// 安全存储错误类型。
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// The platform store is unavailable (no keyring daemon, locked store).
    ///
    /// 平台不支持或不可用。
    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    /// Access was denied by the platform.
    ///
    /// 平台权限拒绝访问。
    #[error("secret store access denied: {0}")]
    PermissionDenied(String),

    /// The stored value could not be read back as written.
    ///
    /// 存储数据损坏或无效。
    #[error("secret store data corrupt: {0}")]
    Corrupt(String),

    #[error("secret store failed: {0}")]
    Other(String),
}

/// Named opaque credential storage.
///
/// Calls are synchronous and short; callers acquire, use and release without
/// holding anything across awaits.
///
/// 按名称存取不透明凭据的端口，调用为同步短操作。
pub trait SecretStorePort: Send + Sync {
    /// Read a secret; `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SecretStoreError>;

    /// Write a secret, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError>;

    /// Remove a secret. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), SecretStoreError>;
}
