//! One request, one conversation.
//!
//! A [`DownloadSession`] wraps the [`Downloader`] with the user-facing side of
//! a request: a "preparing" message that turns into live progress, and a
//! single final message with either the stored file or the error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchkeep::download::DownloadRequest;
//! use fetchkeep::downloader::DownloaderBuilder;
//! use fetchkeep::notify::ConsoleNotifier;
//! use fetchkeep::session::DownloadSession;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), fetchkeep::Error> {
//! let session = DownloadSession::new(
//!     DownloaderBuilder::new().build()?,
//!     Arc::new(ConsoleNotifier::new()),
//! );
//! let request = DownloadRequest::new("https://example.com/report.pdf", 1, 1, 1);
//! session.handle(&request, &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

use crate::download::{DownloadRequest, FileMetadata, UserId};
use crate::downloader::Downloader;
use crate::error::Result;
use crate::notify::{MessageHandle, Notifier};
use crate::progress::{format::preparing_text, ProgressReporter, ProgressSink};

use indicatif::HumanBytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shown instead of counters when the statistics file cannot be read.
pub const STATISTICS_UNAVAILABLE: &str = "statistics are temporarily unavailable";

/// Runs download requests and keeps the requesting user informed.
#[derive(Clone)]
pub struct DownloadSession {
    downloader: Downloader,
    notifier: Arc<dyn Notifier>,
    deliver_file: bool,
}

impl std::fmt::Debug for DownloadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSession")
            .field("downloader", &self.downloader)
            .field("deliver_file", &self.deliver_file)
            .finish_non_exhaustive()
    }
}

impl DownloadSession {
    pub fn new(downloader: Downloader, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            downloader,
            notifier,
            deliver_file: false,
        }
    }

    /// On success, replace the progress message with the stored file itself.
    pub fn deliver_file(mut self, deliver_file: bool) -> Self {
        self.deliver_file = deliver_file;
        self
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Downloads the file of `request`, reporting progress and the outcome.
    ///
    /// The outcome is also returned, so callers can act on it; notification
    /// failures never change it.
    pub async fn handle(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<FileMetadata> {
        let progress_message = match self
            .notifier
            .send_text(request.chat_id, &preparing_text())
            .await
        {
            Ok(message) => Some(message),
            Err(err) => {
                warn!(chat = request.chat_id, error = %err, "failed to send progress message");
                None
            }
        };

        let reporter = progress_message
            .map(|message| ProgressReporter::spawn(self.notifier.clone(), message));
        let result = self
            .downloader
            .download(
                request,
                reporter.as_ref().map(|reporter| reporter as &dyn ProgressSink),
                cancel,
            )
            .await;

        if let Some(reporter) = &reporter {
            reporter.complete().await;
        }

        let text = match &result {
            Ok(metadata) => success_text(metadata),
            Err(err) => failure_text(err),
        };

        if let (Ok(metadata), Some(message), true) =
            (&result, progress_message, self.deliver_file)
        {
            match self
                .notifier
                .replace_with_file(message, &metadata.file_path, &text)
                .await
            {
                Ok(()) => return result,
                Err(err) => warn!(error = %err, "failed to deliver the file, falling back to text"),
            }
        }

        self.edit_or_send(request.chat_id, progress_message, &text).await;
        result
    }

    /// The statistics reply for `user`.
    pub async fn statistics_text(&self, user: UserId) -> String {
        match self.downloader.statistics(user).await {
            Ok(stats) => format!(
                "📊 Downloads: {}\nTotal size: {}",
                stats.downloads,
                HumanBytes(stats.total_size)
            ),
            Err(err) => {
                warn!(user = %user, error = %err, "statistics unavailable");
                STATISTICS_UNAVAILABLE.to_string()
            }
        }
    }

    async fn edit_or_send(&self, chat_id: i64, message: Option<MessageHandle>, text: &str) {
        if let Some(message) = message {
            match self.notifier.edit_text(message, text).await {
                Ok(()) => return,
                Err(err) if err.is_not_modified() => return,
                Err(err) => debug!(
                    error = %err,
                    "editing the progress message failed, sending a new one"
                ),
            }
        }

        if let Err(err) = self.notifier.send_text(chat_id, text).await {
            warn!(chat = chat_id, error = %err, "failed to send the final message");
        }
    }
}

/// `✅ File saved` with the name and human-readable size.
pub fn success_text(metadata: &FileMetadata) -> String {
    format!(
        "✅ File saved\nName: {}\nSize: {}",
        metadata.file_name,
        metadata.formatted_size()
    )
}

pub fn failure_text(err: &crate::Error) -> String {
    format!("❌ Error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::DownloaderBuilder;
    use crate::notify::ConsoleNotifier;

    fn session(dir: &std::path::Path) -> (DownloadSession, Arc<ConsoleNotifier>) {
        let notifier = Arc::new(ConsoleNotifier::hidden());
        let downloader = DownloaderBuilder::new().base_path(dir).build().unwrap();
        (DownloadSession::new(downloader, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn validation_failure_becomes_the_final_message() {
        let dir = tempfile::tempdir().unwrap();
        let (session, notifier) = session(dir.path());

        let request = DownloadRequest::new("ftp://example.com/x", 1, 5, 1);
        assert!(session.handle(&request, &CancellationToken::new()).await.is_err());

        let text = notifier.message_text(MessageHandle::new(5, 1)).unwrap();
        assert_eq!(text, "❌ Error: only HTTP/HTTPS URLs are supported");
    }

    #[tokio::test]
    async fn statistics_reply() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(dir.path());
        let text = session.statistics_text(UserId::new(1).unwrap()).await;
        assert_eq!(text, "📊 Downloads: 0\nTotal size: 0 B");
    }

    #[tokio::test]
    async fn corrupted_statistics_reply() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(dir.path());
        std::fs::write(dir.path().join("stats.json"), "[").unwrap();
        let text = session.statistics_text(UserId::new(1).unwrap()).await;
        assert_eq!(text, STATISTICS_UNAVAILABLE);
    }
}
