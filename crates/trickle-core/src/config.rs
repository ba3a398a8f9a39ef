//! Configuration system for trickle.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $TRICKLE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/trickle/config.toml
//!   3. ~/.config/trickle/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::wire;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrickleConfig {
    pub transfer: TransferConfig,
    pub peripheral: PeripheralConfig,
    pub loopback: LoopbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Blob served to each subscriber. Re-read on every subscribe.
    pub blob_path: PathBuf,
}

/// GATT identity handed to the radio stack hosting the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    pub local_name: String,
    pub service_uuid: String,
    pub characteristic_uuid: String,
    /// Value returned for reads of the characteristic.
    pub read_banner: String,
}

/// The in-process central the daemon drives its adapter with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    /// Max payload size the loopback central negotiates on subscribe.
    pub mtu: usize,
    /// Where the reassembled blob is written.
    pub output_path: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            blob_path: data_dir().join("files").join("music.mp3"),
        }
    }
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            local_name: wire::LOCAL_NAME.to_string(),
            service_uuid: wire::SERVICE_UUID.to_string(),
            characteristic_uuid: wire::CHARACTERISTIC_UUID.to_string(),
            read_banner: wire::READ_BANNER.to_string(),
        }
    }
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            mtu: 20,
            output_path: data_dir().join("received").join("blob.bin"),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("trickle")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("trickle")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("loopback mtu {0} is too small, need at least {}", wire::MIN_PAYLOAD_SIZE)]
    MtuTooSmall(usize),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TrickleConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&path, &text)?
        } else {
            TrickleConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_toml(path: &std::path::Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("TRICKLE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TrickleConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Reject values the transfer path cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loopback.mtu < wire::MIN_PAYLOAD_SIZE {
            return Err(ConfigError::MtuTooSmall(self.loopback.mtu));
        }
        Ok(())
    }

    /// Apply TRICKLE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TRICKLE_TRANSFER__BLOB_PATH") {
            self.transfer.blob_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TRICKLE_PERIPHERAL__LOCAL_NAME") {
            self.peripheral.local_name = v;
        }
        if let Ok(v) = std::env::var("TRICKLE_LOOPBACK__MTU") {
            if let Ok(mtu) = v.parse() {
                self.loopback.mtu = mtu;
            }
        }
        if let Ok(v) = std::env::var("TRICKLE_LOOPBACK__OUTPUT_PATH") {
            self.loopback.output_path = PathBuf::from(v);
        }
    }
}
