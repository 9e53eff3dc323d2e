//! Progress samples for a single transfer.

/// A point-in-time sample of transfer advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes received so far.
    pub bytes_received: u64,
    /// Total size, when known.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    pub fn new(bytes_received: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_received,
            total_bytes,
        }
    }

    /// Known, non-zero total size.
    pub fn known_total(&self) -> Option<u64> {
        self.total_bytes.filter(|total| *total > 0)
    }

    /// Percent complete, clamped to `0..=100`. `None` when the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        self.known_total().map(|total| {
            let percent = (u128::from(self.bytes_received) * 100) / u128::from(total);
            percent.min(100) as u8
        })
    }

    /// Whether every declared byte has arrived.
    pub fn is_finished(&self) -> bool {
        self.known_total() == Some(self.bytes_received)
    }
}
