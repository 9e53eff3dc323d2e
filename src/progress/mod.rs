//! Progress reporting for a single transfer.
//!
//! The storage writer emits a [`DownloadProgress`](crate::download::DownloadProgress)
//! sample after every chunk into any [`ProgressSink`]. The usual sink is a
//! [`ProgressReporter`], which throttles the samples and keeps one
//! notification message up to date.
//!
//! # Overview
//!
//! - `sink` - the [`ProgressSink`] trait, implemented for closures and `indicatif` bars
//! - `throttle` - the [`Throttle`] deciding which samples are forwarded
//! - `reporter` - the [`ProgressReporter`] worker
//! - `format` - the progress message texts
//!
//! # Examples
//!
//! ```rust
//! use fetchkeep::download::DownloadProgress;
//! use fetchkeep::progress::ProgressSink;
//! use indicatif::ProgressBar;
//!
//! let bar = ProgressBar::hidden();
//! bar.report(DownloadProgress::new(512, Some(2048)));
//! assert_eq!(bar.position(), 512);
//! ```

pub mod format;
pub(crate) mod reporter;
pub(crate) mod sink;
pub mod throttle;

pub use reporter::ProgressReporter;
pub use sink::ProgressSink;
pub use throttle::Throttle;
