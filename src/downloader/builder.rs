//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::downloader::DownloaderBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), fetchkeep::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .base_path("./downloads")
//!     .max_file_size(10 * 1024 * 1024)
//!     .timeout(Duration::from_secs(60))
//!     .retries(5)
//!     .header(reqwest::header::USER_AGENT, reqwest::header::HeaderValue::from_static("fetchkeep"))
//!     .build()?;
//! assert_eq!(downloader.retries(), 5);
//! # Ok(())
//! # }
//! ```

use super::{
    config::{DownloaderConfig, Settings},
    downloader::Downloader,
};
use crate::error::{Error, Result};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::path::PathBuf;
use std::time::Duration;

const MIN_DURATION: Duration = Duration::from_millis(1);

/// A builder used to create a [`Downloader`].
#[derive(Debug, Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Creates a builder from file settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            config: DownloaderConfig::from(settings),
        }
    }

    /// Sets the root directory of the storage tree.
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    /// Sets the maximum body size in bytes. 0 disables the limit.
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.config.max_file_size = max_file_size;
        self
    }

    /// Sets the deadline of a single request attempt. Must not be zero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of retries per download.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retry.retries = retries;
        self
    }

    /// Sets the delay before the first retry; it doubles for each following retry.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay.max(MIN_DURATION);
        self
    }

    /// Sets the chrono format of the per-day directory.
    pub fn date_format(mut self, date_format: impl Into<String>) -> Self {
        self.config.date_format = date_format.into();
        self
    }

    /// Enables or disables the metadata sidecar.
    pub fn save_metadata(mut self, save_metadata: bool) -> Self {
        self.config.save_metadata = save_metadata;
        self
    }

    /// Routes every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Add the http headers.
    ///
    /// You need to pass in a `HeaderMap`, not a `HeaderName`.
    /// `HeaderMap` is a set of http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be merged
    /// into a single one.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let new = match self.config.headers {
            Some(mut existing) => {
                existing.extend(headers);
                existing
            }
            None => headers,
        };

        self.config.headers = Some(new);
        self
    }

    /// Add the http header.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut headers = self.config.headers.take().unwrap_or_default();
        headers.insert(name, value);
        self.config.headers = Some(headers);
        self
    }

    /// Checks the configuration and creates the [`Downloader`].
    pub fn build(self) -> Result<Downloader> {
        if self.config.base_path.as_os_str().is_empty() {
            return Err(Error::Config("base path must not be empty".into()));
        }
        if self.config.timeout.is_zero() {
            return Err(Error::Config("timeout must not be zero".into()));
        }
        Downloader::new(self.config)
    }
}
