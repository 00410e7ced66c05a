//! Frame codec
//!
//! Turns socket text into [`InboundFrame`]s and builds the outbound control frames.
//! Event types on the filter list are dropped here and never reach the queue.

use super::{
    GatewayIntents, HelloPayload, IdentifyPayload, IdentifyProperties, InboundFrame,
    OpCode, OutboundMessage, ResumePayload,
};
use crate::error::{GatewayError, GatewayResult};
use monitor_common::BotToken;
use std::collections::HashSet;

/// Event type dropped by default: presence chatter
pub const PRESENCE_UPDATE: &str = "PRESENCE_UPDATE";

/// Stateless JSON envelope codec with an event-type filter
#[derive(Debug, Clone)]
pub struct FrameCodec {
    filtered: HashSet<String>,
}

impl FrameCodec {
    /// Create a codec that drops the given event types
    pub fn new<I, S>(filtered: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filtered: filtered.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if an event type is dropped at decode time
    #[must_use]
    pub fn is_filtered(&self, event_type: &str) -> bool {
        self.filtered.contains(event_type)
    }

    /// Decode one text frame.
    ///
    /// Returns `Ok(None)` for frames whose event type is filtered.
    pub fn decode(&self, raw: &str) -> GatewayResult<Option<InboundFrame>> {
        let frame: InboundFrame = serde_json::from_str(raw).map_err(GatewayError::Decode)?;

        if frame
            .event_type
            .as_deref()
            .is_some_and(|t| self.is_filtered(t))
        {
            tracing::trace!(event_type = %frame.event_type_str(), "Dropping filtered event");
            return Ok(None);
        }

        Ok(Some(frame))
    }

    /// Extract the heartbeat interval from a Hello frame
    pub fn hello_interval(frame: &InboundFrame) -> GatewayResult<u64> {
        let payload = frame
            .payload
            .clone()
            .ok_or_else(|| GatewayError::InvalidHello("missing payload".to_string()))?;
        let hello: HelloPayload = serde_json::from_value(payload)
            .map_err(|e| GatewayError::InvalidHello(e.to_string()))?;

        if hello.heartbeat_interval == 0 {
            return Err(GatewayError::InvalidHello(
                "heartbeat_interval must be positive".to_string(),
            ));
        }
        Ok(hello.heartbeat_interval)
    }

    /// Encode a heartbeat (op 1). `d` is null unless a sequence is supplied.
    #[must_use]
    pub fn encode_heartbeat(last_sequence: Option<u64>) -> String {
        match last_sequence {
            Some(seq) => format!(r#"{{"op":1,"d":{seq}}}"#),
            None => r#"{"op":1,"d":null}"#.to_string(),
        }
    }

    /// Encode an Identify (op 2)
    pub fn encode_identify(
        token: &BotToken,
        intents: GatewayIntents,
        properties: &IdentifyProperties,
    ) -> GatewayResult<String> {
        let payload = IdentifyPayload {
            token,
            intents,
            properties,
        };
        OutboundMessage::new(OpCode::Identify, payload)
            .to_json()
            .map_err(GatewayError::Encode)
    }

    /// Encode a Resume (op 6)
    pub fn encode_resume(token: &BotToken, session_id: &str, seq: u64) -> GatewayResult<String> {
        let payload = ResumePayload {
            token,
            session_id,
            seq,
        };
        OutboundMessage::new(OpCode::Resume, payload)
            .to_json()
            .map_err(GatewayError::Encode)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new([PRESENCE_UPDATE])
    }
}
