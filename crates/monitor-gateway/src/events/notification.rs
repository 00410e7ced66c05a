//! Notifications crossing the session boundary
//!
//! Status, error and event signals are the only outputs of a session.

use crate::broadcast::QueuedEvent;
use crate::error::ErrorKind;
use tokio::sync::mpsc;

/// A signal delivered to the monitoring caller
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Lifecycle milestone (connect, close, reconnect, stop)
    Status { tag: String, message: String },
    /// Recoverable failure
    Error {
        tag: String,
        kind: ErrorKind,
        message: String,
    },
    /// An application event released by the dispatcher
    Event(QueuedEvent),
}

impl Notification {
    /// Tag of status and error notifications
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Status { tag, .. } | Self::Error { tag, .. } => Some(tag),
            Self::Event(_) => None,
        }
    }
}

/// Receiving half handed to the caller
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Cloneable sending half shared by the session and its timers
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver it feeds
    #[must_use]
    pub fn channel() -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit a status notification
    pub fn status(&self, tag: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(tag = %tag, message = %message, "Status");
        self.emit(Notification::Status {
            tag: tag.to_string(),
            message,
        });
    }

    /// Emit an error notification
    pub fn error(&self, tag: &str, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(tag = %tag, kind = %kind, message = %message, "Error");
        self.emit(Notification::Error {
            tag: tag.to_string(),
            kind,
            message,
        });
    }

    /// Emit an event notification
    pub fn event(&self, event: QueuedEvent) {
        tracing::debug!(event_type = %event.event_type, "Event delivered");
        self.emit(Notification::Event(event));
    }

    fn emit(&self, notification: Notification) {
        // The caller may have dropped the receiver; nothing to do then
        if self.tx.send(notification).is_err() {
            tracing::trace!("Notification receiver dropped");
        }
    }
}
