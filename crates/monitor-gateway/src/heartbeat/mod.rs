//! Gateway keep-alive

mod scheduler;

pub use scheduler::{HeartbeatScheduler, HeartbeatSink};
