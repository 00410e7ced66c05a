//! Event ingestion and delivery
//!
//! Decouples bursty socket arrival from metronomic delivery to the application.

mod dispatcher;
mod queue;

pub use dispatcher::{EventHandler, RateLimitedDispatcher, DEFAULT_TICK};
pub use queue::{IngestionQueue, QueueStats, QueuedEvent};
