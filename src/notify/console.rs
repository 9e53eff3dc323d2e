//! A [`Notifier`] that renders messages as terminal lines.
//!
//! Every message is an `indicatif` spinner inside one shared `MultiProgress`;
//! editing a message changes the spinner text, and replacing it with a file
//! finishes the spinner with the caption and the stored path.

use super::{MessageHandle, Notifier, NotifyError};

use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{
    atomic::{AtomicI32, Ordering},
    Mutex, PoisonError,
};
use std::time::Duration;

const TEMPLATE: &str = "{spinner:.blue} {msg}";

struct Entry {
    bar: ProgressBar,
    text: String,
}

/// Terminal notification channel.
pub struct ConsoleNotifier {
    multi: MultiProgress,
    messages: Mutex<HashMap<MessageHandle, Entry>>,
    next_id: AtomicI32,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConsoleNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleNotifier")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl ConsoleNotifier {
    /// Draws to stderr.
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Keeps the messages without drawing anything.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            messages: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Current text of a message.
    pub fn message_text(&self, message: MessageHandle) -> Option<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message)
            .map(|entry| entry.text.clone())
    }

    fn spinner(&self, text: &str) -> ProgressBar {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = self.multi.add(ProgressBar::new_spinner().with_style(style));
        bar.set_message(text.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

fn missing(message: MessageHandle) -> NotifyError {
    NotifyError::Api {
        code: 400,
        message: format!("message {} not found", message.message_id),
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, NotifyError> {
        let handle = MessageHandle::new(chat_id, self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Entry {
            bar: self.spinner(text),
            text: text.to_string(),
        };
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, entry);
        Ok(handle)
    }

    async fn edit_text(&self, message: MessageHandle, text: &str) -> Result<(), NotifyError> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = messages.get_mut(&message).ok_or_else(|| missing(message))?;
        if entry.text == text {
            return Err(NotifyError::NotModified);
        }
        entry.text = text.to_string();
        entry.bar.set_message(entry.text.clone());
        Ok(())
    }

    async fn replace_with_file(
        &self,
        message: MessageHandle,
        path: &Path,
        caption: &str,
    ) -> Result<(), NotifyError> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = messages.get_mut(&message).ok_or_else(|| missing(message))?;
        entry.text = format!("{caption}\n📎 {}", path.display());
        entry.bar.finish_with_message(entry.text.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn edit_changes_text() {
        let notifier = ConsoleNotifier::hidden();
        let handle = notifier.send_text(5, "first").await.unwrap();
        assert_eq!(handle.chat_id, 5);

        notifier.edit_text(handle, "second").await.unwrap();
        assert_eq!(notifier.message_text(handle).as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn unchanged_edit_is_not_modified() {
        let notifier = ConsoleNotifier::hidden();
        let handle = notifier.send_text(5, "same").await.unwrap();
        let err = notifier.edit_text(handle, "same").await.unwrap_err();
        assert!(err.is_not_modified());
    }

    #[tokio::test]
    async fn unknown_message_is_an_api_error() {
        let notifier = ConsoleNotifier::hidden();
        let err = notifier
            .edit_text(MessageHandle::new(1, 99), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Api { code: 400, .. }));
    }

    #[tokio::test]
    async fn replace_with_file_shows_path() {
        let notifier = ConsoleNotifier::hidden();
        let handle = notifier.send_text(1, "working").await.unwrap();
        notifier
            .replace_with_file(handle, Path::new("/tmp/a.pdf"), "done")
            .await
            .unwrap();
        assert_eq!(
            notifier.message_text(handle).as_deref(),
            Some("done\n📎 /tmp/a.pdf")
        );
    }
}
