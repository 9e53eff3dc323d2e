//! Per-user aggregate counters.

use serde::{Deserialize, Serialize};

/// Accumulated download counters of one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDownloadStatistics {
    pub downloads: u64,
    pub total_size: u64,
}

impl UserDownloadStatistics {
    /// Counters after one more download of `size` bytes.
    #[must_use]
    pub fn accumulate(self, size: u64) -> Self {
        Self {
            downloads: self.downloads.saturating_add(1),
            total_size: self.total_size.saturating_add(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_adds_one_download() {
        let stats = UserDownloadStatistics::default()
            .accumulate(100)
            .accumulate(23);
        assert_eq!(
            stats,
            UserDownloadStatistics {
                downloads: 2,
                total_size: 123
            }
        );
    }
}
