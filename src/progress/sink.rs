//! The consumer side of progress events.

use crate::download::DownloadProgress;

use indicatif::ProgressBar;

/// Receives progress samples of one transfer.
///
/// `report` is called from inside the write loop, so implementations must
/// return quickly; anything slow belongs behind a channel (see
/// [`ProgressReporter`](super::ProgressReporter)).
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(DownloadProgress) + Send + Sync,
{
    fn report(&self, progress: DownloadProgress) {
        self(progress)
    }
}

/// Drives a terminal progress bar directly.
impl ProgressSink for ProgressBar {
    fn report(&self, progress: DownloadProgress) {
        if let Some(total) = progress.known_total() {
            self.set_length(total);
        }
        self.set_position(progress.bytes_received);
    }
}
