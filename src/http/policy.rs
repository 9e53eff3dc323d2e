//! Retry and timeout policy for outbound requests.
//!
//! Retries are driven by `reqwest-retry`: [`RetryPolicy::backoff`] produces
//! an exponential backoff whose n-th delay (1-indexed) is exactly
//! `2^(n-1) * base_delay`, and [`TransientStrategy`] decides which outcomes
//! are worth another attempt. [`AttemptTimeout`] bounds every single attempt
//! with a wall-clock deadline; it sits inside the retry middleware so an
//! expired attempt is retried like any other transient failure.

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use reqwest_retry::{
    default_on_request_failure, default_on_request_success, policies::ExponentialBackoff, Jitter,
    Retryable, RetryableStrategy,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::debug;

/// How often and how patiently to retry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry; doubles for each following one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// The backoff policy handed to the retry middleware.
    pub fn backoff(&self) -> ExponentialBackoff {
        let max_delay = self.delay_for_attempt(self.retries.max(1));
        ExponentialBackoff::builder()
            .retry_bounds(self.base_delay, max_delay)
            .jitter(Jitter::None)
            .base(2)
            .build_with_max_retries(self.retries)
    }
}

/// Error produced when a single attempt exceeds its deadline.
#[derive(Debug, thiserror::Error)]
#[error("attempt timed out after {0:?}")]
pub struct AttemptTimedOut(pub Duration);

/// Shared marker recording whether the latest attempt of a request timed out.
///
/// Attached to a request as an extension; the retry middleware hands the same
/// extensions to every attempt, so after `send` returns the marker describes
/// the final attempt.
#[derive(Debug, Clone, Default)]
pub struct AttemptOutcome(Arc<AtomicBool>);

impl AttemptOutcome {
    pub fn timed_out(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set_timed_out(&self, timed_out: bool) {
        self.0.store(timed_out, Ordering::Release);
    }
}

/// Middleware bounding each attempt with a wall-clock deadline.
///
/// The deadline covers the request up to the response headers; the body is
/// streamed afterwards and is bounded by the client's read timeout.
#[derive(Debug, Clone, Copy)]
pub struct AttemptTimeout {
    limit: Duration,
}

impl AttemptTimeout {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

#[async_trait::async_trait]
impl Middleware for AttemptTimeout {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let outcome = extensions.get::<AttemptOutcome>().cloned();
        let result = tokio::time::timeout(self.limit, next.run(req, extensions)).await;

        if let Some(outcome) = outcome {
            outcome.set_timed_out(result.is_err());
        }

        match result {
            Ok(response) => response,
            Err(_) => {
                debug!(limit = ?self.limit, "attempt exceeded its deadline");
                Err(reqwest_middleware::Error::middleware(AttemptTimedOut(self.limit)))
            }
        }
    }
}

/// Retry classification: transport blips, expired attempts, 408, 429 and
/// 5xx are transient; everything else is final.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientStrategy;

impl RetryableStrategy for TransientStrategy {
    fn handle(&self, res: &Result<Response, reqwest_middleware::Error>) -> Option<Retryable> {
        match res {
            Ok(response) => default_on_request_success(response),
            Err(reqwest_middleware::Error::Middleware(err)) if err.is::<AttemptTimedOut>() => {
                Some(Retryable::Transient)
            }
            Err(err) => default_on_request_failure(err),
        }
    }
}

/// Whether a failed request ended because of a deadline, at any layer.
pub fn is_timeout(err: &reqwest_middleware::Error) -> bool {
    match err {
        reqwest_middleware::Error::Reqwest(err) => err.is_timeout(),
        reqwest_middleware::Error::Middleware(err) => err.chain().any(|cause| {
            cause.is::<AttemptTimedOut>()
                || cause
                    .downcast_ref::<reqwest::Error>()
                    .is_some_and(reqwest::Error::is_timeout)
                || cause
                    .downcast_ref::<reqwest_middleware::Error>()
                    .is_some_and(is_timeout)
        }),
    }
}
