//! Session state
//!
//! Written only by the session actor; read by anyone holding the cell.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SessionState {
    /// No socket and no pending attempt
    #[default]
    Disconnected,
    /// Socket being opened
    Connecting,
    /// Socket open, waiting for Hello
    AwaitingHello,
    /// Hello processed; heartbeat and dispatcher running
    Heartbeating,
    /// Explicit stop in progress
    Closing,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingHello => "awaiting_hello",
            Self::Heartbeating => "heartbeating",
            Self::Closing => "closing",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, observable state slot
#[derive(Debug, Clone, Default)]
pub struct StateCell {
    inner: Arc<RwLock<SessionState>>,
}

impl StateCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub fn get(&self) -> SessionState {
        *self.inner.read()
    }

    /// Move to `next`, returning the previous state
    pub fn transition(&self, next: SessionState) -> SessionState {
        let previous = std::mem::replace(&mut *self.inner.write(), next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Session state changed");
        }
        previous
    }
}
