//! Resume bookkeeping
//!
//! Only consulted when resume is enabled; otherwise every connection identifies fresh.

use crate::protocol::ReadyPayload;
use parking_lot::Mutex;
use std::sync::Arc;

/// Last sequence number seen, shared with the heartbeat timer
#[derive(Debug, Clone, Default)]
pub(crate) struct SequenceCell {
    inner: Arc<Mutex<Option<u64>>>,
}

impl SequenceCell {
    pub(crate) fn get(&self) -> Option<u64> {
        *self.inner.lock()
    }

    pub(crate) fn set(&self, seq: u64) {
        *self.inner.lock() = Some(seq);
    }

    pub(crate) fn clear(&self) {
        *self.inner.lock() = None;
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResumeState {
    pub(crate) sequence: SequenceCell,
    session_id: Option<String>,
    resume_url: Option<String>,
}

impl ResumeState {
    pub(crate) fn record_sequence(&self, seq: Option<u64>) {
        if let Some(seq) = seq {
            self.sequence.set(seq);
        }
    }

    pub(crate) fn record_ready(&mut self, ready: ReadyPayload) {
        tracing::debug!(
            has_resume_url = ready.resume_gateway_url.is_some(),
            "Session ready, resume details recorded"
        );
        self.session_id = Some(ready.session_id);
        self.resume_url = ready.resume_gateway_url;
    }

    /// Forget the session so the next connection identifies fresh
    pub(crate) fn clear(&mut self) {
        self.sequence.clear();
        self.session_id = None;
        self.resume_url = None;
    }

    /// Session id and sequence, when both are known
    pub(crate) fn resumable(&self) -> Option<(&str, u64)> {
        Some((self.session_id.as_deref()?, self.sequence.get()?))
    }

    /// URL of the next connection.
    ///
    /// The resume host inherits the query string of the configured URL.
    pub(crate) fn connect_url(&self, configured: &str) -> String {
        match (&self.resume_url, self.resumable()) {
            (Some(host), Some(_)) if !host.contains('?') => match configured.split_once('?') {
                Some((_, query)) => format!("{}/?{query}", host.trim_end_matches('/')),
                None => host.clone(),
            },
            (Some(host), Some(_)) => host.clone(),
            _ => configured.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIGURED: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

    fn ready() -> ReadyPayload {
        ReadyPayload {
            session_id: "abc".to_string(),
            resume_gateway_url: Some("wss://resume.discord.gg".to_string()),
        }
    }

    #[test]
    fn test_fresh_state_is_not_resumable() {
        let state = ResumeState::default();
        assert!(state.resumable().is_none());
        assert_eq!(state.connect_url(CONFIGURED), CONFIGURED);
    }

    #[test]
    fn test_resumable_after_ready_and_sequence() {
        let mut state = ResumeState::default();
        state.record_ready(ready());
        assert!(state.resumable().is_none());

        state.record_sequence(Some(7));
        state.record_sequence(None);
        assert_eq!(state.resumable(), Some(("abc", 7)));
        assert_eq!(
            state.connect_url(CONFIGURED),
            "wss://resume.discord.gg/?v=10&encoding=json"
        );
    }

    #[test]
    fn test_clear_forgets_session() {
        let mut state = ResumeState::default();
        state.record_ready(ready());
        state.record_sequence(Some(3));
        state.clear();

        assert!(state.resumable().is_none());
        assert!(state.sequence.get().is_none());
        assert_eq!(state.connect_url(CONFIGURED), CONFIGURED);
    }
}
