use async_trait::async_trait;
use fetchkeep::download::{DownloadProgress, DownloadRequest};
use fetchkeep::notify::{MessageHandle, Notifier, NotifyError};
use fetchkeep::progress::ProgressSink;
use fetchkeep::DownloaderBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// Common test constants
pub const TEST_USER: i64 = 7;
pub const TEST_CHAT: i64 = 70;
pub const TEST_MESSAGE: i32 = 700;
pub const TEST_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Creates a request of the test user for `url`
pub fn create_test_request(url: &str) -> DownloadRequest {
    DownloadRequest::new(url, TEST_USER, TEST_CHAT, TEST_MESSAGE)
}

/// Creates a downloader builder storing under `base` with fast retries
pub fn create_test_downloader_builder(base: &Path) -> DownloaderBuilder {
    DownloaderBuilder::new()
        .base_path(base)
        .retries(3)
        .retry_delay(TEST_RETRY_DELAY)
        .timeout(Duration::from_secs(5))
}

/// Lists every regular file below `dir`, recursively
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(list_files(&path));
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Lists stored content files, leaving out sidecars and the statistics file
pub fn list_content_files(dir: &Path) -> Vec<PathBuf> {
    list_files(dir)
        .into_iter()
        .filter(|path| !matches!(path.extension(), Some(ext) if ext == "json"))
        .collect()
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

// === Raw HTTP Helpers ===

/// Serves `body` on every connection without a `Content-Length` header.
///
/// The body ends when the connection closes. Returns the server's base URL.
pub async fn spawn_unsized_server(body: Vec<u8>, content_type: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(head.as_bytes()).await;
                for chunk in body.chunks(512) {
                    let _ = socket.write_all(chunk).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{address}")
}

/// Answers every request with `status_line` (e.g. `503 Down For Maintenance`)
/// and an empty body
pub async fn spawn_status_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{address}")
}

/// Serves `head` under a larger declared `Content-Length`, then stalls
/// without closing the connection
pub async fn spawn_stalling_server(head: Vec<u8>, declared_length: u64) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let head = head.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }
                let response_head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                     Content-Length: {declared_length}\r\n\r\n"
                );
                let _ = socket.write_all(response_head.as_bytes()).await;
                let _ = socket.write_all(&head).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    format!("http://{address}")
}

// === Progress Helpers ===

/// Progress sink remembering every sample
#[derive(Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<DownloadProgress>>,
}

impl RecordingSink {
    pub fn samples(&self) -> Vec<DownloadProgress> {
        self.samples.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, progress: DownloadProgress) {
        self.samples.lock().unwrap().push(progress);
    }
}

// === Notifier Helpers ===

/// One call made to a [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Sent(MessageHandle, String),
    Edited(MessageHandle, String),
    File(MessageHandle, PathBuf, String),
}

/// Notifier remembering every call; edits and sends can be made to fail
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Notification>>,
    next_id: Mutex<i32>,
    fail_sends: Mutex<bool>,
    fail_edits: Mutex<bool>,
    fail_files: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of all edits, in call order
    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Notification::Edited(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().unwrap() = fail;
    }

    pub fn fail_edits(&self, fail: bool) {
        *self.fail_edits.lock().unwrap() = fail;
    }

    pub fn fail_files(&self, fail: bool) {
        *self.fail_files.lock().unwrap() = fail;
    }
}

fn api_error() -> NotifyError {
    NotifyError::Api {
        code: 400,
        message: "Bad Request: message can't be edited".into(),
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, NotifyError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(api_error());
        }
        let handle = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            MessageHandle::new(chat_id, *next_id)
        };
        self.calls
            .lock()
            .unwrap()
            .push(Notification::Sent(handle, text.to_string()));
        Ok(handle)
    }

    async fn edit_text(&self, message: MessageHandle, text: &str) -> Result<(), NotifyError> {
        if *self.fail_edits.lock().unwrap() {
            return Err(api_error());
        }
        self.calls
            .lock()
            .unwrap()
            .push(Notification::Edited(message, text.to_string()));
        Ok(())
    }

    async fn replace_with_file(
        &self,
        message: MessageHandle,
        path: &Path,
        caption: &str,
    ) -> Result<(), NotifyError> {
        if *self.fail_files.lock().unwrap() {
            return Err(api_error());
        }
        self.calls.lock().unwrap().push(Notification::File(
            message,
            path.to_path_buf(),
            caption.to_string(),
        ));
        Ok(())
    }
}
