//! Configuration structures and defaults for the downloader.
//!
//! [`Settings`] is the file-facing form (TOML, camelCase keys, every field
//! optional); [`DownloaderConfig`] is what a built [`Downloader`](super::Downloader)
//! runs with.
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::downloader::Settings;
//!
//! let settings = Settings::from_toml_str(r#"
//!     [download]
//!     maxFileSize = 1048576
//!     retryCount = 5
//!
//!     [storage]
//!     basePath = "/srv/files"
//! "#)?;
//! assert_eq!(settings.download.max_file_size, 1_048_576);
//! assert_eq!(settings.download.timeout_seconds, 300);
//! assert!(settings.storage.save_metadata);
//! # Ok::<(), fetchkeep::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::http::RetryPolicy;
use crate::storage::writer::DEFAULT_DATE_FORMAT;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default maximum body size: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Settings as read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub download: DownloadSettings,
    pub storage: StorageSettings,
}

/// The `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadSettings {
    /// Bytes; 0 disables the limit.
    pub max_file_size: u64,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    /// Base of the exponential backoff.
    pub retry_delay_seconds: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            timeout_seconds: 300,
            retry_count: 3,
            retry_delay_seconds: 2,
        }
    }
}

/// The `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    pub base_path: PathBuf,
    /// chrono strftime pattern of the per-day directory.
    pub date_format: String,
    pub save_metadata: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("downloads"),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            save_metadata: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|err| Error::Config(err.to_string()))
    }

    /// Reads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        Self::from_toml_str(&data)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| Error::Config(err.to_string()))
    }
}

/// Configuration structure for the downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Root of the storage tree.
    pub base_path: PathBuf,
    /// Maximum body size in bytes; 0 disables the limit.
    pub max_file_size: u64,
    /// Deadline of one request attempt.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub date_format: String,
    /// Write the `<file>.json` sidecar after each download.
    pub save_metadata: bool,
    pub proxy: Option<reqwest::Proxy>,
    /// Headers sent with every request.
    pub headers: Option<HeaderMap>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for DownloaderConfig {
    /// Seconds below one are raised to one.
    fn from(settings: &Settings) -> Self {
        let download = &settings.download;
        let storage = &settings.storage;
        Self {
            base_path: storage.base_path.clone(),
            max_file_size: download.max_file_size,
            timeout: Duration::from_secs(download.timeout_seconds.max(1)),
            retry: RetryPolicy {
                retries: download.retry_count,
                base_delay: Duration::from_secs(download.retry_delay_seconds.max(1)),
            },
            date_format: storage.date_format.clone(),
            save_metadata: storage.save_metadata,
            proxy: None,
            headers: None,
        }
    }
}
