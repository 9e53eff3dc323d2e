//! Description of a stored file.

use super::UserId;

use chrono::{DateTime, Utc};
use indicatif::HumanBytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata of a successfully stored file.
///
/// Created once per save and never mutated; persisted as the sidecar record
/// and used to update the per-user statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub file_path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
    pub downloaded_at: DateTime<Utc>,
    pub user_id: UserId,
}

impl FileMetadata {
    /// Size rendered with binary units, e.g. `2.00 KiB`.
    pub fn formatted_size(&self) -> String {
        HumanBytes(self.size).to_string()
    }

    /// Where the sidecar record for this file lives: the file path plus `.json`.
    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path_for(&self.file_path)
    }
}

pub(crate) fn sidecar_path_for(file_path: &Path) -> PathBuf {
    let mut path = file_path.as_os_str().to_owned();
    path.push(".json");
    PathBuf::from(path)
}
