//! Payload definitions
//!
//! Structures carried in the `d` field of control frames.

use super::GatewayIntents;
use monitor_common::{BotToken, ClientPropertiesConfig};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the gateway immediately after the socket opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    #[serde(deserialize_with = "whole_millis")]
    pub heartbeat_interval: u64,
}

/// Accept `41250` as well as `41250.0`
fn whole_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(ms) = number.as_u64() {
        return Ok(ms);
    }
    match number.as_f64() {
        Some(ms) if ms >= 0.0 && ms.fract() == 0.0 => Ok(ms as u64),
        _ => Err(de::Error::custom(format!(
            "heartbeat_interval must be a whole number of milliseconds, got {number}"
        ))),
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyPayload<'a> {
    pub token: &'a BotToken,
    pub intents: GatewayIntents,
    pub properties: &'a IdentifyProperties,
}

/// Client connection properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl IdentifyProperties {
    /// Create properties with the same client name for browser and device
    #[must_use]
    pub fn new(os: impl Into<String>, client: impl Into<String>) -> Self {
        let client = client.into();
        Self {
            os: os.into(),
            browser: client.clone(),
            device: client,
        }
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self::new(std::env::consts::OS, env!("CARGO_PKG_NAME"))
    }
}

impl From<&ClientPropertiesConfig> for IdentifyProperties {
    fn from(config: &ClientPropertiesConfig) -> Self {
        Self {
            os: config.os.clone(),
            browser: config.browser.clone(),
            device: config.device.clone(),
        }
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize)]
pub struct ResumePayload<'a> {
    pub token: &'a BotToken,
    pub session_id: &'a str,
    pub seq: u64,
}

/// The fields of a `READY` dispatch needed to resume later
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_payload() {
        let hello: HelloPayload = serde_json::from_str(r#"{"heartbeat_interval":41250}"#).unwrap();
        assert_eq!(hello.heartbeat_interval, 41_250);
    }

    #[test]
    fn test_hello_interval_as_float() {
        let hello: HelloPayload =
            serde_json::from_str(r#"{"heartbeat_interval":41250.0}"#).unwrap();
        assert_eq!(hello.heartbeat_interval, 41_250);

        assert!(serde_json::from_str::<HelloPayload>(r#"{"heartbeat_interval":41250.5}"#).is_err());
        assert!(serde_json::from_str::<HelloPayload>(r#"{"heartbeat_interval":-5}"#).is_err());
        assert!(serde_json::from_str::<HelloPayload>(r#"{"heartbeat_interval":"41250"}"#).is_err());
    }

    #[test]
    fn test_identify_payload_serialization() {
        let token = BotToken::new("token123");
        let properties = IdentifyProperties::new("linux", "gateway-monitor");
        let payload = IdentifyPayload {
            token: &token,
            intents: GatewayIntents::all(),
            properties: &properties,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["token"], "token123");
        assert_eq!(json["intents"], 3_276_799);
        assert_eq!(json["properties"]["os"], "linux");
        assert_eq!(json["properties"]["browser"], "gateway-monitor");
        assert_eq!(json["properties"]["device"], "gateway-monitor");
    }

    #[test]
    fn test_properties_from_config() {
        let config = ClientPropertiesConfig {
            os: "android".to_string(),
            browser: "appinventor".to_string(),
            device: "phone".to_string(),
        };
        let props = IdentifyProperties::from(&config);
        assert_eq!(props.os, "android");
        assert_eq!(props.device, "phone");
    }

    #[test]
    fn test_ready_payload() {
        let ready: ReadyPayload = serde_json::from_value(serde_json::json!({
            "v": 10,
            "session_id": "abc",
            "resume_gateway_url": "wss://resume.example",
            "user": {"id": "1"}
        }))
        .unwrap();
        assert_eq!(ready.session_id, "abc");
        assert_eq!(ready.resume_gateway_url.as_deref(), Some("wss://resume.example"));
    }
}
