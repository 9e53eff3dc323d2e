//! Value types of the download pipeline.
//!
//! Every type here is immutable once built and validates itself on
//! construction, so the rest of the crate never re-checks its inputs.
//!
//! - [`url`] - the validated remote location ([`DownloadUrl`])
//! - [`user`] - the requesting user ([`UserId`])
//! - [`request`] - the inbound request and its validated form
//! - [`progress`] - transfer progress samples ([`DownloadProgress`])
//! - [`metadata`] - the record of a stored file ([`FileMetadata`])
//! - [`statistics`] - per-user counters ([`UserDownloadStatistics`])
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::download::DownloadRequest;
//!
//! let command = DownloadRequest::new("https://example.com/report.pdf", 7, 7, 1).validate()?;
//! assert_eq!(command.user.get(), 7);
//!
//! let err = DownloadRequest::new("ftp://example.com/x", 7, 7, 1).validate().unwrap_err();
//! assert_eq!(err.to_string(), "only HTTP/HTTPS URLs are supported");
//! # Ok::<(), fetchkeep::Error>(())
//! ```

pub mod metadata;
pub mod progress;
pub mod request;
pub mod statistics;
pub mod url;
pub mod user;

pub use metadata::FileMetadata;
pub use progress::DownloadProgress;
pub use request::{DownloadCommand, DownloadRequest};
pub use statistics::UserDownloadStatistics;
pub use url::DownloadUrl;
pub use user::UserId;
