//! Streaming the response body to its destination file.

use super::filename;
use crate::download::{DownloadProgress, FileMetadata, UserId};
use crate::error::{Error, Result};
use crate::http::BodyStream;
use crate::progress::ProgressSink;

use bytes::Bytes;
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Utc,
};
use futures::StreamExt;
use reqwest::Url;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Largest piece written to disk at once.
pub const CHUNK_SIZE: usize = 80 * 1024;
/// Content type recorded when the server sent none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
/// Default name of the per-day directory, e.g. `2024-01-31`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Inputs that decide the stored filename.
#[derive(Debug, Clone, Copy)]
pub struct FileNaming<'a> {
    /// Attachment name declared by the server.
    pub declared_name: Option<&'a str>,
    /// URL the body was served from, after redirects.
    pub url: &'a Url,
    pub content_type: Option<&'a str>,
}

/// Writes bodies under `<base>/<user>/<date>/<name>`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    date_format: String,
}

impl FileStorage {
    /// Fails when `date_format` is not a valid chrono format string.
    pub fn new(base_path: impl Into<PathBuf>, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        validate_date_format(&date_format)?;
        Ok(Self {
            base_path: base_path.into(),
            date_format,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Directory holding the files `user` stored at `at`.
    pub fn directory_for(&self, user: UserId, at: DateTime<Utc>) -> PathBuf {
        self.base_path
            .join(user.to_string())
            .join(at.format(&self.date_format).to_string())
    }

    /// Streams `body` into the destination file of `user`.
    ///
    /// A `(0, total_hint)` sample goes to `progress` before the first read,
    /// then one sample per written piece. The resulting size is the number of
    /// bytes actually written. On any failure the partial file is removed.
    pub async fn save(
        &self,
        body: BodyStream,
        naming: &FileNaming<'_>,
        user: UserId,
        total_hint: Option<u64>,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FileMetadata> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled("save"));
        }

        let downloaded_at = Utc::now();
        let file_name = filename::resolve(naming.declared_name, naming.url, naming.content_type);
        let directory = self.directory_for(user, downloaded_at);
        let file_path = directory.join(&file_name);

        fs::create_dir_all(&directory)
            .await
            .map_err(|err| storage_error(user, &directory, err))?;
        let mut file = fs::File::create(&file_path)
            .await
            .map_err(|err| storage_error(user, &file_path, err))?;
        debug!(user = %user, path = %file_path.display(), "writing file");

        let written = write_body(&mut file, body, total_hint, progress, cancel).await;
        drop(file);

        let size = match written {
            Ok(size) => size,
            Err(err) => {
                remove_partial(&file_path).await;
                return Err(match err {
                    WriteError::Io(err) => storage_error(user, &file_path, err),
                    WriteError::Other(err) => {
                        if !err.is_cancelled() {
                            warn!(user = %user, error = %err, "transfer failed while saving");
                        }
                        err
                    }
                });
            }
        };

        info!(user = %user, path = %file_path.display(), size, "file saved");
        Ok(FileMetadata {
            file_path,
            file_name,
            size,
            content_type: naming
                .content_type
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            downloaded_at,
            user_id: user,
        })
    }
}

enum WriteError {
    Io(io::Error),
    Other(Error),
}

impl From<Error> for WriteError {
    fn from(err: Error) -> Self {
        WriteError::Other(err)
    }
}

async fn write_body(
    file: &mut fs::File,
    mut body: BodyStream,
    total_hint: Option<u64>,
    progress: Option<&dyn ProgressSink>,
    cancel: &CancellationToken,
) -> std::result::Result<u64, WriteError> {
    let report = |written| {
        if let Some(sink) = progress {
            sink.report(DownloadProgress::new(written, total_hint));
        }
    };

    let mut written: u64 = 0;
    report(written);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("save").into()),
            next = body.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };

        let mut chunk: Bytes = chunk?;
        while !chunk.is_empty() {
            let piece = chunk.split_to(chunk.len().min(CHUNK_SIZE));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled("save").into()),
                result = file.write_all(&piece) => result.map_err(WriteError::Io)?,
            }
            written += piece.len() as u64;
            report(written);
        }
    }

    file.flush().await.map_err(WriteError::Io)?;
    Ok(written)
}

async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove partial file"),
    }
}

fn storage_error(user: UserId, path: &Path, source: io::Error) -> Error {
    error!(user = %user, path = %path.display(), error = %source, "failed to save file");
    Error::Storage { source }
}

fn validate_date_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(Error::Config("date format must not be empty".into()));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::Config(format!("invalid date format `{format}`")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures::stream;
    use std::sync::Mutex;

    fn body(chunks: Vec<Result<Bytes>>) -> BodyStream {
        stream::iter(chunks).boxed()
    }

    fn user() -> UserId {
        UserId::new(7).unwrap()
    }

    #[test]
    fn rejects_bad_date_format() {
        assert!(FileStorage::new("/tmp", "%Y-%m-%d").is_ok());
        assert!(matches!(
            FileStorage::new("/tmp", "%Q"),
            Err(Error::Config(_))
        ));
        assert!(FileStorage::new("/tmp", " ").is_err());
    }

    #[test]
    fn directory_layout() {
        let storage = FileStorage::new("/data", DEFAULT_DATE_FORMAT).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(
            storage.directory_for(user(), at),
            PathBuf::from("/data/7/2024-03-09")
        );
    }

    #[tokio::test]
    async fn writes_in_bounded_pieces_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_DATE_FORMAT).unwrap();
        let url = Url::parse("https://example.com/big.bin").unwrap();
        let naming = FileNaming {
            declared_name: None,
            url: &url,
            content_type: None,
        };

        let data = Bytes::from(vec![7u8; CHUNK_SIZE * 2 + 10]);
        let seen = Mutex::new(Vec::new());
        let sink = |p: DownloadProgress| seen.lock().unwrap().push(p);

        let metadata = storage
            .save(
                body(vec![Ok(data.clone())]),
                &naming,
                user(),
                Some(data.len() as u64),
                Some(&sink),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(metadata.file_name, "big.bin");
        assert_eq!(metadata.size, data.len() as u64);
        assert_eq!(metadata.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(std::fs::read(&metadata.file_path).unwrap(), data);

        let received: Vec<u64> = seen.lock().unwrap().iter().map(|p| p.bytes_received).collect();
        assert_eq!(
            received,
            vec![0, CHUNK_SIZE as u64, 2 * CHUNK_SIZE as u64, data.len() as u64]
        );
    }

    #[tokio::test]
    async fn failed_body_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_DATE_FORMAT).unwrap();
        let url = Url::parse("https://example.com/broken.bin").unwrap();
        let naming = FileNaming {
            declared_name: None,
            url: &url,
            content_type: None,
        };

        let err = storage
            .save(
                body(vec![Ok(Bytes::from_static(b"partial")), Err(Error::Timeout)]),
                &naming,
                user(),
                None,
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));

        let path = storage.directory_for(user(), Utc::now()).join("broken.bin");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn cancelled_save() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_DATE_FORMAT).unwrap();
        let url = Url::parse("https://example.com/slow.bin").unwrap();
        let naming = FileNaming {
            declared_name: None,
            url: &url,
            content_type: None,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = storage
            .save(stream::pending().boxed(), &naming, user(), None, None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "save operation cancelled");
    }

    #[tokio::test]
    async fn cancel_mid_transfer_removes_written_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_DATE_FORMAT).unwrap();
        let url = Url::parse("https://example.com/stalled.bin").unwrap();
        let naming = FileNaming {
            declared_name: None,
            url: &url,
            content_type: None,
        };

        let head = stream::iter(vec![Ok(Bytes::from_static(b"head"))]);
        let stalled: BodyStream = head.chain(stream::pending()).boxed();
        let cancel = CancellationToken::new();
        let largest = Mutex::new(0);
        let sink = |p: DownloadProgress| {
            *largest.lock().unwrap() = p.bytes_received;
            if p.bytes_received > 0 {
                cancel.cancel();
            }
        };

        let err = storage
            .save(stalled, &naming, user(), None, Some(&sink), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "save operation cancelled");
        assert_eq!(*largest.lock().unwrap(), 4);
        let path = storage.directory_for(user(), Utc::now()).join("stalled.bin");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unwritable_base_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let storage = FileStorage::new(&blocker, DEFAULT_DATE_FORMAT).unwrap();
        let url = Url::parse("https://example.com/a.txt").unwrap();
        let naming = FileNaming {
            declared_name: None,
            url: &url,
            content_type: Some("text/plain"),
        };

        let err = storage
            .save(body(vec![]), &naming, user(), None, None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to save the file");
    }
}
