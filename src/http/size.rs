//! Size budget enforcement for response bodies.
//!
//! A declared `Content-Length` above the limit is rejected before the body is
//! touched. A body of unknown length is buffered up to the limit first; once
//! it fits, the buffered bytes stand in for the network stream. Bodies that
//! pass the pre-check are still counted while they stream, so a server that
//! under-declares its length cannot push more than the limit to disk.

use super::fetch::{BodyStream, RemoteFile};
use crate::error::{Error, Result};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Applies the size budget to `remote`. `None` means unlimited.
pub async fn enforce(
    remote: RemoteFile,
    limit: Option<u64>,
    probe_deadline: Duration,
    cancel: &CancellationToken,
) -> Result<RemoteFile> {
    let Some(limit) = limit else {
        return Ok(remote);
    };

    match remote.content_length {
        Some(length) if length > limit => {
            warn!(size = length, limit, "declared size exceeds the limit");
            Err(Error::SizeExceeded {
                size: length,
                limit,
            })
        }
        Some(_) => Ok(RemoteFile {
            body: bounded(remote.body, limit),
            ..remote
        }),
        None => {
            let buffered = probe(remote.body, limit, probe_deadline, cancel).await?;
            let length = buffered.len() as u64;
            debug!(size = length, "unknown-length body buffered within the limit");
            Ok(RemoteFile {
                content_length: Some(length),
                body: stream::once(async move { Ok(buffered) }).boxed(),
                ..remote
            })
        }
    }
}

/// Buffers `body` completely, failing as soon as more than `limit` bytes arrive.
pub async fn probe(
    mut body: BodyStream,
    limit: u64,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let read = async {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| {
                warn!(error = %err, "size probe failed");
                Error::SizeCheck
            })?;
            buffer.extend_from_slice(&chunk);

            let size = buffer.len() as u64;
            if size > limit {
                warn!(size, limit, "buffered size exceeds the limit");
                return Err(Error::SizeExceeded { size, limit });
            }
        }
        Ok(buffer.freeze())
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled("download")),
        result = tokio::time::timeout(deadline, read) => result.unwrap_or_else(|_| {
            warn!(?deadline, "size probe timed out");
            Err(Error::SizeCheck)
        }),
    }
}

/// Wraps `body` so that it yields an error once more than `limit` bytes passed.
pub fn bounded(body: BodyStream, limit: u64) -> BodyStream {
    let mut seen: u64 = 0;
    body.map(move |chunk| {
        let chunk = chunk?;
        seen = seen.saturating_add(chunk.len() as u64);
        if seen > limit {
            warn!(size = seen, limit, "body grew past the limit while streaming");
            return Err(Error::SizeExceeded { size: seen, limit });
        }
        Ok(chunk)
    })
    .boxed()
}
