//! Forwards throttled progress to a notification message.
//!
//! Samples are queued on an unbounded channel and handled by one worker task
//! per reporter, so the write loop never waits on the notification channel
//! and edits of the same message never overlap. The worker applies the
//! [`Throttle`] and turns each surviving sample into an edit of the progress
//! message.

use super::{format::progress_text, sink::ProgressSink, throttle::Throttle};
use crate::download::DownloadProgress;
use crate::notify::{MessageHandle, Notifier};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

enum Command {
    Report(DownloadProgress),
    Flush(oneshot::Sender<()>),
    Complete(oneshot::Sender<()>),
}

/// Progress sink bound to one message of a [`Notifier`].
#[derive(Debug)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<Command>,
    completed: Arc<AtomicBool>,
    message: MessageHandle,
}

impl ProgressReporter {
    /// Starts the worker task. Must be called inside a tokio runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>, message: MessageHandle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let completed = Arc::new(AtomicBool::new(false));
        tokio::spawn(run(notifier, message, rx, completed.clone()));
        Self {
            tx,
            completed,
            message,
        }
    }

    pub fn message(&self) -> MessageHandle {
        self.message
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Waits until every sample queued so far has been handled.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Stops forwarding for good. Samples still queued are dropped.
    ///
    /// Returns once the worker has stopped, so no edit can land after the
    /// caller's own final edit. Calling it again is a no-op.
    pub async fn complete(&self) {
        if self.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Complete(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&self, progress: DownloadProgress) {
        if self.is_completed() {
            return;
        }
        let _ = self.tx.send(Command::Report(progress));
    }
}

async fn run(
    notifier: Arc<dyn Notifier>,
    message: MessageHandle,
    mut rx: mpsc::UnboundedReceiver<Command>,
    completed: Arc<AtomicBool>,
) {
    let mut throttle = Throttle::new(Instant::now());

    while let Some(command) = rx.recv().await {
        match command {
            Command::Report(progress) => {
                if completed.load(Ordering::Acquire) {
                    continue;
                }
                let now = Instant::now();
                if !throttle.should_emit(&progress, now) {
                    continue;
                }
                match notifier.edit_text(message, &progress_text(&progress)).await {
                    Ok(()) => throttle.record(&progress, now),
                    Err(err) if err.is_not_modified() => throttle.record(&progress, now),
                    Err(err) => warn!(
                        chat = message.chat_id,
                        message = message.message_id,
                        error = %err,
                        "failed to update progress message"
                    ),
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
            Command::Complete(ack) => {
                let _ = ack.send(());
                break;
            }
        }
    }
    debug!(message = message.message_id, "progress reporter stopped");
}
