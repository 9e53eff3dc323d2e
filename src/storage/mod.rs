//! Everything that touches the disk.
//!
//! - [`writer`] - streams a body to `<base>/<user>/<date>/<name>` ([`FileStorage`])
//! - [`filename`] - picks and sanitizes the stored name
//! - [`sidecar`] - the `<file>.json` metadata record ([`MetadataStorage`])
//! - [`stats`] - the shared `stats.json` counters ([`StatisticsStore`])

pub mod filename;
pub mod sidecar;
pub mod stats;
pub mod writer;

pub use sidecar::MetadataStorage;
pub use stats::StatisticsStore;
pub use writer::{FileNaming, FileStorage};
