//! The shared per-user statistics file.
//!
//! One JSON object maps user ids (as strings) to their counters. Every read
//! and every read-modify-write cycle holds the store's gate, so concurrent
//! downloads never lose each other's updates. Writes go to a temporary file
//! that is then renamed over the real one.

use crate::download::{FileMetadata, UserDownloadStatistics, UserId};
use crate::error::{Error, Result};

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

/// Name of the counters file inside the storage root.
pub const STATS_FILE_NAME: &str = "stats.json";

type Counters = BTreeMap<String, UserDownloadStatistics>;

/// Serialized access to the counters file.
#[derive(Debug)]
pub struct StatisticsStore {
    path: PathBuf,
    gate: Mutex<()>,
}

impl StatisticsStore {
    /// Store backed by `<base_path>/stats.json`.
    pub fn new(base_path: &Path) -> Self {
        Self::at(base_path.join(STATS_FILE_NAME))
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds one download of `metadata.size` bytes to the owner's counters.
    ///
    /// Returns the updated counters.
    pub async fn record(&self, metadata: &FileMetadata) -> Result<UserDownloadStatistics> {
        let _guard = self.gate.lock().await;

        let mut counters = self.load().await?;
        let entry = counters
            .entry(metadata.user_id.to_string())
            .or_default();
        *entry = entry.accumulate(metadata.size);
        let updated = *entry;

        self.store(&counters).await?;
        debug!(
            user = %metadata.user_id,
            downloads = updated.downloads,
            total_size = updated.total_size,
            "statistics updated"
        );
        Ok(updated)
    }

    /// Counters of `user`; zero when the user has no history.
    pub async fn get(&self, user: UserId) -> Result<UserDownloadStatistics> {
        let _guard = self.gate.lock().await;
        let counters = self.load().await?;
        Ok(counters.get(&user.to_string()).copied().unwrap_or_default())
    }

    async fn load(&self) -> Result<Counters> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Counters::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Counters::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "statistics file is corrupted");
            Error::StatisticsCorrupted { source }
        })
    }

    async fn store(&self, counters: &Counters) -> Result<()> {
        let json = serde_json::to_vec_pretty(counters)
            .map_err(|err| self.io_error(io::Error::other(err)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).await.map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| self.io_error(err))
    }

    fn io_error(&self, source: io::Error) -> Error {
        error!(path = %self.path.display(), error = %source, "statistics file access failed");
        Error::StatisticsIo { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn metadata(user: i64, size: u64) -> FileMetadata {
        FileMetadata {
            file_path: PathBuf::from("/unused"),
            file_name: "unused".into(),
            size,
            content_type: "text/plain".into(),
            downloaded_at: Utc::now(),
            user_id: UserId::new(user).unwrap(),
        }
    }

    #[tokio::test]
    async fn unknown_user_has_zero_counters() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatisticsStore::new(dir.path());
        let stats = store.get(UserId::new(3).unwrap()).await.unwrap();
        assert_eq!(stats, UserDownloadStatistics::default());
    }

    #[tokio::test]
    async fn records_accumulate_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatisticsStore::new(dir.path());

        store.record(&metadata(1, 100)).await.unwrap();
        let updated = store.record(&metadata(1, 50)).await.unwrap();
        store.record(&metadata(2, 7)).await.unwrap();

        assert_eq!(updated.downloads, 2);
        assert_eq!(updated.total_size, 150);
        assert_eq!(
            store.get(UserId::new(2).unwrap()).await.unwrap().total_size,
            7
        );

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(json["1"]["downloads"], 2);
        assert_eq!(json["1"]["totalSize"], 150);
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StatisticsStore::new(dir.path()));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record(&metadata(9, 10)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = store.get(UserId::new(9).unwrap()).await.unwrap();
        assert_eq!(stats.downloads, 20);
        assert_eq!(stats.total_size, 200);
    }

    #[tokio::test]
    async fn blank_file_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatisticsStore::new(dir.path());
        std::fs::write(store.path(), "  \n").unwrap();
        assert_eq!(
            store.get(UserId::new(1).unwrap()).await.unwrap(),
            UserDownloadStatistics::default()
        );
    }

    #[tokio::test]
    async fn corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatisticsStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.get(UserId::new(1).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::StatisticsCorrupted { .. }));
        assert!(store.record(&metadata(1, 1)).await.is_err());
    }
}
