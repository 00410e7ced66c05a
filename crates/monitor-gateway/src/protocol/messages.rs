//! Gateway message format
//!
//! Every socket text frame is a JSON object `{op, d, t, s}`.

use super::OpCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded inbound frame.
///
/// Transient: the session inspects it and then drops it or turns it into a queued event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    /// Raw operation code, kept as an integer so unknown codes pass through
    #[serde(rename = "op")]
    pub opcode: i64,

    /// Event type (dispatch frames only)
    #[serde(rename = "t", default)]
    pub event_type: Option<String>,

    /// Sequence number (dispatch frames only)
    #[serde(rename = "s", default)]
    pub sequence: Option<u64>,

    /// Event data payload
    #[serde(rename = "d", default)]
    pub payload: Option<Value>,
}

impl InboundFrame {
    /// Known op code, if any
    #[must_use]
    pub fn op(&self) -> Option<OpCode> {
        OpCode::from_raw(self.opcode)
    }

    /// Event type, empty when absent
    #[must_use]
    pub fn event_type_str(&self) -> &str {
        self.event_type.as_deref().unwrap_or_default()
    }

    /// Consume the frame, yielding `(event_type, payload)` when it carries an object payload
    #[must_use]
    pub fn into_event_parts(self) -> Option<(String, Map<String, Value>)> {
        match self.payload {
            Some(Value::Object(map)) => Some((self.event_type.unwrap_or_default(), map)),
            _ => None,
        }
    }
}

impl std::fmt::Display for InboundFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InboundFrame(op={}", OpCode::describe(self.opcode))?;
        if let Some(t) = &self.event_type {
            write!(f, ", t={t}")?;
        }
        if let Some(s) = self.sequence {
            write!(f, ", s={s}")?;
        }
        write!(f, ")")
    }
}

/// An outbound control frame.
///
/// `d` is always serialized, so a heartbeat without a sequence goes out as `"d":null`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage<T: Serialize> {
    pub op: u8,
    pub d: T,
}

impl<T: Serialize> OutboundMessage<T> {
    /// Create a frame for a known op code
    pub fn new(op: OpCode, d: T) -> Self {
        Self { op: op.as_u8(), d }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
