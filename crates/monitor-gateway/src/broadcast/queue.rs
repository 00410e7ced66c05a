//! Ingestion queue
//!
//! Unbounded FIFO between the socket reader (producer) and the dispatcher (consumer).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// An application event waiting for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedEvent {
    /// Event type from the `t` field, empty when absent
    pub event_type: String,
    /// Event data from the `d` field
    pub payload: Map<String, Value>,
    /// When the frame was received
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedEvent {
    /// Create an event stamped with the current time
    pub fn new(event_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Point-in-time queue metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Events currently waiting
    pub depth: usize,
    /// Events ever offered (monotonic)
    pub total_enqueued: u64,
    /// Largest depth ever observed (monotonic)
    pub high_water_mark: usize,
}

#[derive(Debug, Default)]
struct QueueInner {
    events: Mutex<VecDeque<QueuedEvent>>,
    total_enqueued: AtomicU64,
    high_water_mark: AtomicUsize,
}

/// Thread-safe unbounded FIFO of [`QueuedEvent`]s.
///
/// Clones share the same underlying queue.
#[derive(Debug, Clone, Default)]
pub struct IngestionQueue {
    inner: Arc<QueueInner>,
}

impl IngestionQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Never blocks and never rejects.
    pub fn offer(&self, event: QueuedEvent) {
        let depth = {
            let mut events = self.inner.events.lock();
            events.push_back(event);
            events.len()
        };

        self.inner.total_enqueued.fetch_add(1, Ordering::Relaxed);
        self.inner.high_water_mark.fetch_max(depth, Ordering::Relaxed);
        tracing::trace!(depth, "Event enqueued");
    }

    /// Remove the oldest event, if any. Never blocks.
    pub fn poll(&self) -> Option<QueuedEvent> {
        self.inner.events.lock().pop_front()
    }

    /// Number of events waiting
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.events.lock().len()
    }

    /// Check if no events are waiting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Total events ever offered
    #[must_use]
    pub fn total_enqueued(&self) -> u64 {
        self.inner.total_enqueued.load(Ordering::Relaxed)
    }

    /// Largest depth ever observed
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.inner.high_water_mark.load(Ordering::Relaxed)
    }

    /// Snapshot all metrics
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            depth: self.depth(),
            total_enqueued: self.total_enqueued(),
            high_water_mark: self.high_water_mark(),
        }
    }

    /// Drop every waiting event, returning how many were discarded
    pub fn clear(&self) -> usize {
        let mut events = self.inner.events.lock();
        let discarded = events.len();
        events.clear();
        discarded
    }
}
