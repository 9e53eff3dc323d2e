//! Error handling for the fetchkeep library.
//!
//! Every expected failure of the download pipeline is a variant of [`Error`].
//! The `Display` form of each variant is the single-line message shown to the
//! requesting user; the underlying cause, when there is one, is kept as the
//! error source so it can be logged without leaking into user-facing text.

use std::io;
use thiserror::Error;

/// Errors that can happen while fetching and persisting a file.
#[derive(Error, Debug)]
pub enum Error {
    /// The inbound request or one of its values failed validation.
    ///
    /// Never retried; the message is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// Transport-level failure, after the retry budget was spent.
    #[error("network error while downloading the file")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The per-attempt deadline expired, after the retry budget was spent.
    #[error("timed out while downloading the file")]
    Timeout,

    /// The body is larger than the configured maximum.
    #[error("file size exceeds the allowed limit")]
    SizeExceeded { size: u64, limit: u64 },

    /// The size of a body without a declared length could not be established.
    #[error("could not verify the file size")]
    SizeCheck,

    /// Filesystem failure while writing the content file.
    #[error("failed to save the file")]
    Storage {
        #[source]
        source: io::Error,
    },

    /// Failure while writing the metadata sidecar.
    #[error("failed to save file metadata")]
    Metadata {
        #[source]
        source: io::Error,
    },

    /// Filesystem failure while reading or writing the statistics file.
    #[error("failed to access download statistics")]
    StatisticsIo {
        #[source]
        source: io::Error,
    },

    /// The statistics file exists but does not hold valid counters.
    #[error("download statistics are corrupted")]
    StatisticsCorrupted {
        #[source]
        source: serde_json::Error,
    },

    /// The operation was cancelled through its cancellation token.
    #[error("{0} operation cancelled")]
    Cancelled(&'static str),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Error from an underlying system that fits no other category.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure is likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { .. } | Error::Timeout => true,
            Error::Http { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }

    /// Whether the failure is a cancellation rather than an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub(crate) fn network<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Network {
            source: Box::new(source),
        }
    }
}

/// Result type alias for operations that can fail with a fetchkeep error.
pub type Result<T> = std::result::Result<T, Error>;
