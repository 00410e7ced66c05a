//! Caller-facing monitor handle
//!
//! Starts and stops the session actor and enforces one live session per handle.

use super::session::GatewaySession;
use super::{SessionConfig, SessionState, StateCell};
use crate::broadcast::{IngestionQueue, QueueStats};
use crate::error::ErrorKind;
use crate::events::{NotificationReceiver, Notifier};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub(crate) const STATUS_STOPPED: &str = "Monitoring stopped.";

struct LiveSession {
    tag: String,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
    queue: IngestionQueue,
}

/// Handle to a monitored gateway connection
pub struct GatewayMonitor {
    config: Arc<SessionConfig>,
    notifier: Notifier,
    state: StateCell,
    live: Mutex<Option<LiveSession>>,
}

impl GatewayMonitor {
    /// Create a monitor and the receiver for its notifications
    #[must_use]
    pub fn new(config: SessionConfig) -> (Self, NotificationReceiver) {
        let (notifier, rx) = Notifier::channel();
        let monitor = Self {
            config: Arc::new(config),
            notifier,
            state: StateCell::new(),
            live: Mutex::new(None),
        };
        (monitor, rx)
    }

    /// Start monitoring under `tag`.
    ///
    /// Must be called inside a Tokio runtime. If a session is already live an
    /// error notification is emitted and nothing else happens.
    pub fn start_monitoring(&self, tag: &str) {
        let mut live = self.live.lock();

        if let Some(current) = live.as_ref() {
            if !current.task.is_finished() {
                self.notifier.error(
                    tag,
                    ErrorKind::Session,
                    format!("Monitoring already active for tag {}", current.tag),
                );
                return;
            }
        }

        let queue = IngestionQueue::new();
        let (stop, stop_rx) = oneshot::channel();
        let session = GatewaySession::new(
            tag.to_string(),
            self.config.clone(),
            self.notifier.clone(),
            self.state.clone(),
            queue.clone(),
        );
        // Connecting before the task runs so state() never reports a stale Disconnected
        self.state.transition(SessionState::Connecting);
        let task = tokio::spawn(session.run(stop_rx));

        tracing::info!(tag = %tag, "Monitoring started");
        *live = Some(LiveSession {
            tag: tag.to_string(),
            stop,
            task,
            queue,
        });
    }

    /// Stop monitoring. Safe from any state.
    ///
    /// Returns once the socket is closed and no heartbeat, dispatch or
    /// reconnect can happen anymore.
    pub async fn stop_monitoring(&self, tag: &str) {
        let current = self.live.lock().take();

        if let Some(current) = current {
            if current.tag != tag {
                tracing::debug!(live = %current.tag, requested = %tag, "Stopping session under a different tag");
            }
            if !current.task.is_finished() {
                self.state.transition(SessionState::Closing);
            }
            // Fails only when the session already ended on its own
            let _ = current.stop.send(());
            if let Err(e) = current.task.await {
                tracing::warn!(tag = %tag, error = %e, "Session task ended abnormally");
            }
        }

        self.state.transition(SessionState::Disconnected);
        self.notifier.status(tag, STATUS_STOPPED);
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Check if a session task is running
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.live
            .lock()
            .as_ref()
            .is_some_and(|current| !current.task.is_finished())
    }

    /// Metrics of the live session's queue
    #[must_use]
    pub fn queue_stats(&self) -> Option<QueueStats> {
        self.live.lock().as_ref().map(|current| current.queue.stats())
    }
}

impl std::fmt::Debug for GatewayMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMonitor")
            .field("url", &self.config.url)
            .field("state", &self.state.get())
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}
