//! Texts shown in the progress message.

use crate::download::DownloadProgress;

use indicatif::HumanBytes;

const HEADER: &str = "⬇️ Downloading file";

/// Text shown before the first byte arrives.
pub fn preparing_text() -> String {
    format!("{HEADER}\nPreparing...")
}

/// Text for one progress sample.
pub fn progress_text(progress: &DownloadProgress) -> String {
    let received = HumanBytes(progress.bytes_received);
    match (progress.percent(), progress.known_total()) {
        (Some(percent), Some(total)) => format!(
            "{HEADER}\nProgress: {percent}% ({received} of {})",
            HumanBytes(total)
        ),
        _ => format!("{HEADER}\nReceived: {received}"),
    }
}
