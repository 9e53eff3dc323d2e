//! HTTP client setup and middleware configuration.
//!
//! The client is a plain `reqwest` client wrapped with three middlewares,
//! outermost first:
//!
//! - **Tracing**: request/response spans via `reqwest-tracing`
//! - **Retry**: exponential backoff on transient failures (see [`RetryPolicy`])
//! - **Attempt timeout**: a hard deadline per attempt (see [`AttemptTimeout`])
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::http::{create_http_client, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! # Ok(())
//! # }
//! ```

use super::policy::{AttemptTimeout, RetryPolicy, TransientStrategy};

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Retry budget and backoff.
    pub retry: RetryPolicy,
    /// Deadline of a single attempt; also the idle read timeout of the body.
    pub timeout: Duration,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(300),
            proxy: None,
            headers: None,
        }
    }
}

/// Creates an HTTP client with the tracing, retry and attempt-timeout middlewares.
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder = reqwest::Client::builder().read_timeout(config.timeout);

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let retry = RetryTransientMiddleware::new_with_policy_and_strategy(
        config.retry.backoff(),
        TransientStrategy,
    );

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .with(retry)
        // Inside the retry layer, so every attempt gets its own deadline.
        .with(AttemptTimeout::new(config.timeout))
        .build();

    Ok(client)
}
