//! Event summaries
//!
//! Flattens the commonly used fields of a message-style payload.

use serde::Serialize;
use serde_json::{Map, Value};

const MISSING: &str = "N/A";

/// Commonly used fields of an event payload, each optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub event_type: String,
    pub content: Option<String>,
    pub message_id: Option<String>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

impl EventSummary {
    /// Extract a summary from a dispatch payload
    #[must_use]
    pub fn from_payload(event_type: &str, payload: &Map<String, Value>) -> Self {
        let author = payload.get("author").and_then(Value::as_object);

        Self {
            event_type: event_type.to_string(),
            content: string_field(payload, "content"),
            message_id: string_field(payload, "id"),
            channel_id: string_field(payload, "channel_id"),
            guild_id: string_field(payload, "guild_id"),
            user_id: author.and_then(|a| string_field(a, "id")),
            username: author.and_then(|a| string_field(a, "username")),
        }
    }

    /// Render as `key: value` lines with "N/A" for missing fields
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let field = |v: &Option<String>| v.as_deref().unwrap_or(MISSING).to_string();
        vec![
            format!("eventType: {}", self.event_type),
            format!("content: {}", field(&self.content)),
            format!("messageId: {}", field(&self.message_id)),
            format!("channelId: {}", field(&self.channel_id)),
            format!("serverId: {}", field(&self.guild_id)),
            format!("userId: {}", field(&self.user_id)),
            format!("username: {}", field(&self.username)),
        ]
    }
}

// Snowflakes arrive as strings, but accept numbers too
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
