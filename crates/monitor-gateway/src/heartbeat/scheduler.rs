//! Heartbeat scheduler
//!
//! Sends a keep-alive immediately and then on every interval until cancelled.
//! A failed send is reported and the timer keeps going; reconnecting is the
//! session's decision, driven by the socket closing.

use crate::error::{ErrorKind, GatewayResult};
use crate::events::Notifier;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Destination of heartbeat frames
pub trait HeartbeatSink: Send + Sync + 'static {
    fn send_heartbeat(&self) -> GatewayResult<()>;
}

/// Periodic heartbeat sender bound to one connection attempt
#[derive(Default)]
pub struct HeartbeatScheduler {
    task: Option<JoinHandle<()>>,
    interval: Option<Duration>,
}

impl HeartbeatScheduler {
    /// Create an idle scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start sending heartbeats through `sink`.
    ///
    /// Any previous timer is aborted first so at most one is ever active.
    pub fn start<S: HeartbeatSink>(
        &mut self,
        every: Duration,
        sink: S,
        notifier: Notifier,
        tag: impl Into<String>,
    ) {
        self.abort();
        let tag = tag.into();

        self.task = Some(tokio::spawn(async move {
            // Burst keeps sends on multiples of the interval
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                match sink.send_heartbeat() {
                    Ok(()) => tracing::trace!(tag = %tag, "Heartbeat sent"),
                    Err(e) => notifier.error(
                        &tag,
                        ErrorKind::Heartbeat,
                        format!("Failed to send heartbeat: {e}"),
                    ),
                }
            }
        }));
        self.interval = Some(every);

        tracing::debug!(interval_ms = every.as_millis(), "Heartbeat started");
    }

    /// Stop the timer and wait for it to wind down.
    ///
    /// Safe before `start` and when called repeatedly.
    pub async fn cancel(&mut self) {
        self.interval = None;
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            tracing::debug!("Heartbeat cancelled");
        }
    }

    /// Check if a timer is active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Interval of the active timer
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.abort();
    }
}

impl std::fmt::Debug for HeartbeatScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatScheduler")
            .field("running", &self.is_running())
            .field("interval", &self.interval)
            .finish()
    }
}
