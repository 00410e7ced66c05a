//! Caller-facing event surface
//!
//! Notifications emitted by a session and helpers for reading event payloads.

mod notification;
mod summary;

pub use notification::{Notification, NotificationReceiver, Notifier};
pub use summary::EventSummary;
