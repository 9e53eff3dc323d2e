//! Downloader module containing the orchestrator and its configuration.
//!
//! # Overview
//!
//! - `builder` - the [`DownloaderBuilder`]
//! - `config` - file [`Settings`] and the runtime [`DownloaderConfig`]
//! - `downloader` - the [`Downloader`] that runs one request end to end
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::downloader::{DownloaderBuilder, Settings};
//!
//! # fn example() -> Result<(), fetchkeep::Error> {
//! let settings = Settings::default();
//! let downloader = DownloaderBuilder::from_settings(&settings).build()?;
//! assert_eq!(downloader.timeout().as_secs(), 300);
//! # Ok(())
//! # }
//! ```

pub(crate) mod builder;
pub(crate) mod config;
#[allow(clippy::module_inception)]
pub(crate) mod downloader;

pub use builder::DownloaderBuilder;
pub use config::{DownloadSettings, DownloaderConfig, Settings, StorageSettings};
pub use downloader::Downloader;
