//! Rate-limited dispatcher
//!
//! Releases at most one queued event per tick to the application handler.
//! A burst of N events drains over N ticks; there is no token bucket or priority.

use super::{IngestionQueue, QueuedEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default dispatch tick: one event per second
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Receives events released by the dispatcher
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: QueuedEvent);
}

impl<F> EventHandler for F
where
    F: Fn(QueuedEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: QueuedEvent) {
        self(event);
    }
}

/// Drains an [`IngestionQueue`] on a fixed cadence
///
/// The time of the last delivery outlives `stop`, so a restarted dispatcher
/// waits out the rest of the tick before its first release.
pub struct RateLimitedDispatcher {
    queue: IngestionQueue,
    last_delivery: Arc<Mutex<Option<Instant>>>,
    task: Option<JoinHandle<()>>,
}

impl RateLimitedDispatcher {
    /// Create a stopped dispatcher over a queue
    #[must_use]
    pub fn new(queue: IngestionQueue) -> Self {
        Self {
            queue,
            last_delivery: Arc::default(),
            task: None,
        }
    }

    /// Start ticking.
    ///
    /// The first tick fires immediately, or one full tick after the last
    /// delivery if that is later. A dispatcher that is already running is
    /// aborted first.
    pub fn start<H: EventHandler>(&mut self, tick: Duration, handler: H) {
        self.abort();

        let now = Instant::now();
        let first = (*self.last_delivery.lock())
            .map_or(now, |last| (last + tick).max(now));

        let queue = self.queue.clone();
        let last_delivery = self.last_delivery.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first, tick);
            // Delay keeps consecutive deliveries at least one tick apart after a stall
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Some(event) = queue.poll() {
                    tracing::trace!(
                        event_type = %event.event_type,
                        remaining = queue.depth(),
                        "Dispatching event"
                    );
                    *last_delivery.lock() = Some(Instant::now());
                    handler.handle(event);
                }
            }
        }));

        tracing::debug!(
            tick_ms = tick.as_millis(),
            held_ms = first.saturating_duration_since(now).as_millis(),
            "Dispatcher started"
        );
    }

    /// Stop ticking and wait for the tick task to finish. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled is the expected outcome
            let _ = task.await;
            tracing::debug!("Dispatcher stopped");
        }
    }

    /// Check if the dispatcher is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RateLimitedDispatcher {
    fn drop(&mut self) {
        self.abort();
    }
}

impl std::fmt::Debug for RateLimitedDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedDispatcher")
            .field("running", &self.is_running())
            .field("depth", &self.queue.depth())
            .finish()
    }
}
