//! # Configuration DTO / 配置数据
//!
//! Plain data mapped from the TOML config file. Missing keys become the
//! documented defaults; nothing here validates values, that happens when the
//! application layer turns the DTO into runtime settings.
//!
//! > **This module contains data only, no policy.**
//! > **此模块只包含数据结构定义。**

use std::path::PathBuf;

/// Default throttle interval for outbound snapshots.
pub const DEFAULT_THROTTLE_INTERVAL_SECS: u64 = 10;

/// Default deadline for a device-selection round trip.
pub const DEFAULT_SELECTION_TIMEOUT_SECS: u64 = 120;

/// Which secret store backend persists the paired devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretBackend {
    Keyring,
    File,
    Memory,
    /// Unrecognised value, kept as-is so the caller can report it.
    Other(String),
}

impl SecretBackend {
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "keyring" => SecretBackend::Keyring,
            "file" => SecretBackend::File,
            "memory" => SecretBackend::Memory,
            _ => SecretBackend::Other(name.to_string()),
        }
    }
}

/// Application configuration DTO (pure data, no logic)
/// 应用配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `[sync] throttle_interval_secs`
    pub throttle_interval_secs: u64,

    /// `[pairing] selection_timeout_secs`
    pub selection_timeout_secs: u64,

    /// `[storage] secret_backend`
    pub secret_backend: SecretBackend,

    /// `[storage] secrets_dir`; empty means "use the platform data dir"
    pub secrets_dir: PathBuf,

    /// `[logging] log_dir`; empty means stdout only
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    /// 从 TOML 值创建 AppConfig
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let section = |name: &str, key: &str| toml_value.get(name).and_then(|s| s.get(key));

        Ok(Self {
            throttle_interval_secs: section("sync", "throttle_interval_secs")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(DEFAULT_THROTTLE_INTERVAL_SECS),
            selection_timeout_secs: section("pairing", "selection_timeout_secs")
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(DEFAULT_SELECTION_TIMEOUT_SECS),
            secret_backend: SecretBackend::from_name(
                section("storage", "secret_backend")
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
            ),
            secrets_dir: PathBuf::from(
                section("storage", "secrets_dir")
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
            ),
            log_dir: PathBuf::from(
                section("logging", "log_dir")
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
            ),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            throttle_interval_secs: DEFAULT_THROTTLE_INTERVAL_SECS,
            selection_timeout_secs: DEFAULT_SELECTION_TIMEOUT_SECS,
            secret_backend: SecretBackend::Keyring,
            secrets_dir: PathBuf::new(),
            log_dir: PathBuf::new(),
        }
    }
}
