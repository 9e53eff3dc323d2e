//! The outbound notification channel.
//!
//! The pipeline talks to its user through a [`Notifier`]: it sends a message,
//! keeps editing it while bytes arrive and finally replaces it with the result.
//! The transport behind the trait is not part of this crate; [`console`]
//! provides a terminal implementation.

pub mod console;

pub use console::ConsoleNotifier;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Opaque handle of a message that was sent through a [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i32,
}

impl MessageHandle {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Failure reported by a [`Notifier`].
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The edit would not change what the user sees.
    #[error("message is not modified")]
    NotModified,

    /// The remote side rejected the call.
    #[error("notification API error {code}: {message}")]
    Api { code: i32, message: String },

    /// The call did not reach the remote side.
    #[error("notification transport failed")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl NotifyError {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, NotifyError::NotModified)
    }
}

/// Sends and edits user-visible messages.
///
/// Calls on the same message must not overlap; callers serialize them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a new text message and returns its handle.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageHandle, NotifyError>;

    /// Replaces the text of an existing message.
    async fn edit_text(&self, message: MessageHandle, text: &str) -> Result<(), NotifyError>;

    /// Replaces an existing message with a file attachment.
    async fn replace_with_file(
        &self,
        message: MessageHandle,
        path: &Path,
        caption: &str,
    ) -> Result<(), NotifyError>;
}
