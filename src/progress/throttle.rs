//! Decides which progress samples are worth forwarding.

use crate::download::DownloadProgress;

use tokio::time::{Duration, Instant};

/// Minimum percent advance between two updates of a sized transfer.
pub const PERCENT_STEP: u8 = 5;
/// Byte advance that forces an update of an unsized transfer.
pub const UNKNOWN_SIZE_BYTE_STEP: u64 = 512 * 1024;
/// Elapsed time that forces an update of an unsized transfer.
pub const UNKNOWN_SIZE_INTERVAL: Duration = Duration::from_secs(2);

/// State of the last forwarded update.
#[derive(Debug, Clone)]
pub struct Throttle {
    emitted: bool,
    last_percent: Option<u8>,
    last_bytes: u64,
    last_emit: Instant,
}

impl Throttle {
    pub fn new(now: Instant) -> Self {
        Self {
            emitted: false,
            last_percent: None,
            last_bytes: 0,
            last_emit: now,
        }
    }

    /// Whether `progress` should be forwarded at `now`.
    ///
    /// The first sample always goes out. After that, sized transfers need
    /// a 5-point advance or the final tick at 100%; a percent that was
    /// already shown is never repeated unless every byte has arrived.
    /// Unsized transfers need 512 KiB since the last update, or 2 seconds.
    pub fn should_emit(&self, progress: &DownloadProgress, now: Instant) -> bool {
        if !self.emitted {
            return true;
        }
        match progress.percent() {
            Some(percent) => match self.last_percent {
                None => true,
                Some(last) if percent == last => progress.is_finished(),
                Some(last) => percent >= last.saturating_add(PERCENT_STEP) || percent >= 100,
            },
            None => {
                let bytes = progress.bytes_received.saturating_sub(self.last_bytes);
                bytes >= UNKNOWN_SIZE_BYTE_STEP
                    || now.saturating_duration_since(self.last_emit) >= UNKNOWN_SIZE_INTERVAL
            }
        }
    }

    /// Marks `progress` as forwarded.
    pub fn record(&mut self, progress: &DownloadProgress, now: Instant) {
        self.emitted = true;
        if let Some(percent) = progress.percent() {
            self.last_percent = Some(percent);
        }
        self.last_bytes = progress.bytes_received;
        self.last_emit = now;
    }
}
