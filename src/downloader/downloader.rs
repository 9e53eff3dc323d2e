//! The download orchestrator.
//!
//! [`Downloader::download`] runs one request end to end, short-circuiting on
//! the first failure:
//!
//! 1. validate the request;
//! 2. fetch the URL under the retry/timeout policy;
//! 3. bound the size (declared length or buffered probe);
//! 4. stream the body to disk, reporting progress;
//! 5. write the metadata sidecar (when enabled; a failure fails the download);
//! 6. record statistics (a failure is only logged).
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchkeep::download::DownloadRequest;
//! use fetchkeep::downloader::DownloaderBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), fetchkeep::Error> {
//! let downloader = DownloaderBuilder::new().base_path("./downloads").build()?;
//! let request = DownloadRequest::new("https://example.com/report.pdf", 42, 42, 1);
//!
//! let metadata = downloader
//!     .download(&request, None, &CancellationToken::new())
//!     .await?;
//! println!("{} ({})", metadata.file_name, metadata.formatted_size());
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use crate::download::{
    DownloadCommand, DownloadRequest, FileMetadata, UserDownloadStatistics, UserId,
};
use crate::error::{Error, Result};
use crate::http::{create_http_client, Fetcher, HttpClientConfig};
use crate::progress::ProgressSink;
use crate::storage::{FileNaming, FileStorage, MetadataStorage, StatisticsStore};

use reqwest::header::HeaderMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Represents the download controller.
///
/// Cheap to clone; clones share the HTTP client and the statistics gate.
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
    fetcher: Fetcher,
    storage: FileStorage,
    metadata: MetadataStorage,
    statistics: Arc<StatisticsStore>,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Result<Self> {
        let storage = FileStorage::new(config.base_path.clone(), config.date_format.clone())?;

        let client = create_http_client(HttpClientConfig {
            retry: config.retry,
            timeout: config.timeout,
            proxy: config.proxy.clone(),
            headers: config.headers.clone(),
        })
        .map_err(|err| Error::Config(format!("cannot build the HTTP client: {err}")))?;

        Ok(Self {
            fetcher: Fetcher::new(client, config.max_file_size, config.timeout),
            storage,
            metadata: MetadataStorage::new(),
            statistics: Arc::new(StatisticsStore::new(&config.base_path)),
            config,
        })
    }

    /// Gets the root of the storage tree.
    pub fn base_path(&self) -> &PathBuf {
        &self.config.base_path
    }

    /// Gets the maximum body size; 0 means unlimited.
    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    /// Gets the per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Gets the number of retries per download.
    pub fn retries(&self) -> u32 {
        self.config.retry.retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.config.retry.base_delay
    }

    pub fn date_format(&self) -> &str {
        &self.config.date_format
    }

    pub fn save_metadata(&self) -> bool {
        self.config.save_metadata
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Path of the shared statistics file.
    pub fn statistics_path(&self) -> &Path {
        self.statistics.path()
    }

    /// Downloads the file named by `request` and stores it for its user.
    ///
    /// `progress` receives a sample before the first byte and after every
    /// written chunk. Cancelling `cancel` aborts the fetch, the size probe or
    /// the write loop with [`Error::Cancelled`]; a partially written file is
    /// removed.
    #[instrument(skip_all, fields(user = request.user_id, url = %request.url))]
    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FileMetadata> {
        let command = request.validate().inspect_err(|err| {
            debug!(error = %err, "request rejected");
        })?;
        self.run(&command, progress, cancel).await
    }

    /// Like [`download`](Self::download) for an already validated command.
    pub async fn run(
        &self,
        command: &DownloadCommand,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FileMetadata> {
        let remote = self.fetcher.fetch(&command.url, cancel).await?;
        let total_hint = remote.content_length;
        let naming = FileNaming {
            declared_name: remote.declared_name.as_deref(),
            url: &remote.final_url,
            content_type: remote.content_type.as_deref(),
        };

        let metadata = self
            .storage
            .save(remote.body, &naming, command.user, total_hint, progress, cancel)
            .await?;

        if self.config.save_metadata {
            self.metadata.save(&metadata, cancel).await?;
        }

        match self.statistics.record(&metadata).await {
            Ok(stats) => debug!(
                downloads = stats.downloads,
                total_size = stats.total_size,
                "statistics recorded"
            ),
            Err(err) => warn!(error = %err, "failed to record statistics"),
        }

        info!(
            file = %metadata.file_name,
            size = metadata.size,
            "download finished"
        );
        Ok(metadata)
    }

    /// Accumulated counters of `user`.
    pub async fn statistics(&self, user: UserId) -> Result<UserDownloadStatistics> {
        self.statistics.get(user).await
    }
}

#[cfg(test)]
mod tests {
    use crate::downloader::DownloaderBuilder;
    use crate::download::{DownloadRequest, UserId};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn invalid_request_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = DownloaderBuilder::new()
            .base_path(dir.path())
            .build()
            .unwrap();

        let err = downloader
            .download(
                &DownloadRequest::new("ftp://example.com/x", 1, 1, 1),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "only HTTP/HTTPS URLs are supported");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn statistics_default_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = DownloaderBuilder::new()
            .base_path(dir.path())
            .build()
            .unwrap();
        let stats = downloader
            .statistics(UserId::new(11).unwrap())
            .await
            .unwrap();
        assert_eq!(stats.downloads, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(downloader.statistics_path(), dir.path().join("stats.json"));
    }
}
