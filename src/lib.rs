//! Fetchkeep downloads files over HTTP(S) on behalf of users and keeps them.
//!
//! Each request is validated, fetched with retries and a per-attempt
//! deadline, bounded by a maximum size, streamed to
//! `<base>/<user>/<date>/<name>` with live progress, described by a JSON
//! sidecar and counted in a shared per-user statistics file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fetchkeep::{download::DownloadRequest, downloader::DownloaderBuilder, Error};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new().base_path("output").build()?;
//! let request = DownloadRequest::new("https://example.com/report.pdf", 1, 1, 1);
//! let metadata = downloader
//!     .download(&request, None, &CancellationToken::new())
//!     .await?;
//! println!("saved {} ({})", metadata.file_path.display(), metadata.formatted_size());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - value types: URL, user id, request, progress, metadata, statistics
//! - [`downloader`] - the `Downloader` orchestrator, its builder and settings
//! - [`error`] - centralized error handling with the `Error` enum
//! - [`http`] - HTTP client, retry/timeout policy, fetch and size enforcement
//! - [`storage`] - file writer, metadata sidecar and statistics store
//! - [`progress`] - progress sinks, throttling and the reporter
//! - [`notify`] - the notification channel interface
//! - [`session`] - progress and result messages around one request
//! - [`logging`] - tracing subscriber setup

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod logging;
pub mod notify;
pub mod progress;
pub mod session;
pub mod storage;

pub use download::{
    DownloadProgress, DownloadRequest, DownloadUrl, FileMetadata, UserDownloadStatistics, UserId,
};
pub use downloader::{Downloader, DownloaderBuilder, Settings};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use notify::{MessageHandle, Notifier, NotifyError};
pub use progress::{ProgressReporter, ProgressSink};
pub use session::DownloadSession;
