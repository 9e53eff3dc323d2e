//! HTTP side of the pipeline.
//!
//! This module builds the middleware client, issues the GET request and
//! enforces the size budget before any byte reaches the disk.
//!
//! # Overview
//!
//! - [`client`] - client creation with tracing, retry and attempt-timeout middleware
//! - [`policy`] - retry backoff, transient classification and the attempt deadline
//! - [`fetch`] - the [`Fetcher`] that turns a URL into a [`RemoteFile`]
//! - [`size`] - declared-length checks and the probe for bodies of unknown length
//! - [`headers`] - `Content-Type` and `Content-Disposition` parsing
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchkeep::download::DownloadUrl;
//! use fetchkeep::http::{create_http_client, Fetcher, HttpClientConfig, RetryPolicy};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig {
//!     retry: RetryPolicy { retries: 3, base_delay: Duration::from_secs(2) },
//!     timeout: Duration::from_secs(60),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! let fetcher = Fetcher::new(client, 10 * 1024 * 1024, Duration::from_secs(60));
//!
//! let url = DownloadUrl::parse("https://example.com/report.pdf")?;
//! let remote = fetcher.fetch(&url, &CancellationToken::new()).await?;
//! println!("{:?} bytes of {:?}", remote.content_length, remote.content_type);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod fetch;
pub mod headers;
pub mod policy;
pub mod size;

pub use client::{create_http_client, HttpClientConfig};
pub use fetch::{BodyStream, Fetcher, RemoteFile};
pub use policy::RetryPolicy;
