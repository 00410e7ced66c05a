//! Session settings

use super::ReconnectPolicy;
use crate::broadcast::DEFAULT_TICK;
use crate::protocol::{FrameCodec, GatewayIntents, IdentifyProperties, PRESENCE_UPDATE};
use monitor_common::{AppConfig, BotToken};
use std::time::Duration;

/// Default gateway endpoint, JSON encoding
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Everything a session needs to connect and deliver events
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub token: BotToken,
    pub intents: GatewayIntents,
    pub properties: IdentifyProperties,
    /// Event types dropped at decode time
    pub filtered_events: Vec<String>,
    pub dispatch_tick: Duration,
    pub reconnect: ReconnectPolicy,
    /// Resume a dropped session instead of identifying fresh
    pub resume: bool,
}

impl SessionConfig {
    /// Create settings with defaults for everything but the endpoint and credential
    pub fn new(url: impl Into<String>, token: impl Into<BotToken>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            intents: GatewayIntents::default(),
            properties: IdentifyProperties::default(),
            filtered_events: vec![PRESENCE_UPDATE.to_string()],
            dispatch_tick: DEFAULT_TICK,
            reconnect: ReconnectPolicy::default(),
            resume: false,
        }
    }

    pub fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_filtered_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dispatch_tick(mut self, tick: Duration) -> Self {
        self.dispatch_tick = tick;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_resume(mut self, enabled: bool) -> Self {
        self.resume = enabled;
        self
    }

    pub(crate) fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.filtered_events.iter().cloned())
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        let gateway = &config.gateway;
        Self {
            url: gateway.url.clone(),
            token: gateway.token.clone(),
            intents: GatewayIntents::from_raw(gateway.intents),
            properties: IdentifyProperties::from(&gateway.properties),
            filtered_events: gateway.filtered_events.clone(),
            dispatch_tick: Duration::from_millis(config.dispatch.tick_ms),
            reconnect: ReconnectPolicy::from(&config.reconnect),
            resume: gateway.resume,
        }
    }
}
