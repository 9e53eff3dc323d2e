//! Metadata sidecar records.

use crate::download::FileMetadata;
use crate::error::{Error, Result};

use std::io;
use std::path::PathBuf;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Writes [`FileMetadata`] as pretty JSON next to the stored file (`<file>.json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataStorage;

impl MetadataStorage {
    pub fn new() -> Self {
        Self
    }

    /// Persists `metadata` and returns the sidecar path.
    pub async fn save(
        &self,
        metadata: &FileMetadata,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let path = metadata.sidecar_path();
        let json = serde_json::to_vec_pretty(metadata)
            .map_err(|err| metadata_error(metadata, io::Error::other(err)))?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("save")),
            result = fs::write(&path, json) => result.map_err(|err| metadata_error(metadata, err))?,
        }

        debug!(user = %metadata.user_id, path = %path.display(), "metadata saved");
        Ok(path)
    }

    /// Reads a sidecar back.
    pub async fn load(&self, path: &std::path::Path) -> Result<FileMetadata> {
        let bytes = fs::read(path)
            .await
            .map_err(|source| Error::Metadata { source })?;
        serde_json::from_slice(&bytes).map_err(|err| Error::Metadata {
            source: io::Error::new(io::ErrorKind::InvalidData, err),
        })
    }
}

fn metadata_error(metadata: &FileMetadata, source: io::Error) -> Error {
    error!(
        user = %metadata.user_id,
        path = %metadata.file_path.display(),
        error = %source,
        "failed to save metadata"
    );
    Error::Metadata { source }
}
