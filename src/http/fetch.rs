//! Issuing the GET request and exposing the response body as a stream.

use super::headers::{attachment_name, declared_length, media_type};
use super::policy::{is_timeout, AttemptOutcome};
use crate::download::DownloadUrl;
use crate::error::{Error, Result};

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use hyper::ext::ReasonPhrase;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Body of a successful response, chunk by chunk.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A successful response whose body has not been consumed yet.
pub struct RemoteFile {
    /// URL after redirects.
    pub final_url: Url,
    /// Filename from `Content-Disposition`, if the server sent one.
    pub declared_name: Option<String>,
    /// Media type without parameters.
    pub content_type: Option<String>,
    /// Body length, when known.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("final_url", &self.final_url.as_str())
            .field("declared_name", &self.declared_name)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Performs GET requests through the middleware client and enforces the size budget.
#[derive(Clone)]
pub struct Fetcher {
    client: ClientWithMiddleware,
    limit: Option<u64>,
    timeout: Duration,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("limit", &self.limit)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// `max_file_size` of zero disables the size limit.
    pub fn new(client: ClientWithMiddleware, max_file_size: u64, timeout: Duration) -> Self {
        Self {
            client,
            limit: (max_file_size > 0).then_some(max_file_size),
            timeout,
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Fetches `url`, returning the response once its size is known to fit.
    ///
    /// Retries and per-attempt deadlines are applied by the client's
    /// middleware. A non-success status is reported as [`Error::Http`] without
    /// touching the body.
    pub async fn fetch(&self, url: &DownloadUrl, cancel: &CancellationToken) -> Result<RemoteFile> {
        let remote = self.request(url, cancel).await?;
        // The probe of a body without a declared length gets at least a second.
        let probe_deadline = self.timeout.max(Duration::from_secs(1));
        super::size::enforce(remote, self.limit, probe_deadline, cancel).await
    }

    async fn request(&self, url: &DownloadUrl, cancel: &CancellationToken) -> Result<RemoteFile> {
        debug!(url = %url, "fetching");
        let outcome = AttemptOutcome::default();
        let send = self
            .client
            .get(url.as_url().clone())
            .with_extension(outcome.clone())
            .send();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("download")),
            result = send => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(err) if outcome.timed_out() || is_timeout(&err) => {
                warn!(url = %url, error = %err, "request timed out");
                return Err(Error::Timeout);
            }
            Err(err) => {
                error!(url = %url, error = %err, "request failed");
                return Err(Error::network(err));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let reason = reason_phrase(&response);
            warn!(url = %url, status = status.as_u16(), "server answered with an error status");
            return Err(Error::Http {
                status: status.as_u16(),
                reason,
            });
        }

        let remote = RemoteFile {
            final_url: response.url().clone(),
            declared_name: attachment_name(&response),
            content_type: media_type(&response),
            content_length: declared_length(&response),
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(body_error))
                .boxed(),
        };
        debug!(?remote, "response headers received");
        Ok(remote)
    }
}

fn body_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        warn!(error = %err, "body read timed out");
        Error::Timeout
    } else {
        error!(error = %err, "body read failed");
        Error::network(err)
    }
}

// hyper only keeps the received phrase when it differs from the canonical one.
fn reason_phrase(response: &reqwest::Response) -> String {
    let status = response.status();
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .filter(|phrase| !phrase.trim().is_empty())
        .or_else(|| status.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}
