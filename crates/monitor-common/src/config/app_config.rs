//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional `.env` file.

use crate::auth::BotToken;
use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: GatewayConfig,
    pub dispatch: DispatchConfig,
    pub reconnect: ReconnectConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
    pub monitor_tag: String,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub token: BotToken,
    pub intents: u64,
    pub properties: ClientPropertiesConfig,
    /// Event types dropped at decode time
    pub filtered_events: Vec<String>,
    pub resume: bool,
}

/// Client properties sent with Identify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPropertiesConfig {
    pub os: String,
    pub browser: String,
    pub device: String,
}

/// Dispatcher settings
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub tick_ms: u64,
}

/// Reconnect behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub strategy: ReconnectStrategyKind,
    pub delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: Option<u32>,
}

/// Delay growth between reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectStrategyKind {
    /// Same delay before every attempt
    Fixed,
    /// Delay doubles per attempt up to the ceiling
    #[default]
    Exponential,
}

// Default value functions
fn default_app_name() -> String {
    "gateway-monitor".to_string()
}

fn default_monitor_tag() -> String {
    "monitor".to_string()
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

fn default_intents() -> u64 {
    3_276_799
}

fn default_client_name() -> String {
    "gateway-monitor".to_string()
}

fn default_filtered_events() -> Vec<String> {
    vec!["PRESENCE_UPDATE".to_string()]
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_BOT_TOKEN")
            .map(BotToken::new)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("DISCORD_BOT_TOKEN"))?;

        let strategy = match lookup("RECONNECT_STRATEGY") {
            None => ReconnectStrategyKind::default(),
            Some(s) => match s.to_lowercase().as_str() {
                "fixed" => ReconnectStrategyKind::Fixed,
                "exponential" => ReconnectStrategyKind::Exponential,
                _ => return Err(ConfigError::InvalidValue("RECONNECT_STRATEGY", s)),
            },
        };

        let tick_ms = parse_or(&lookup, "DISPATCH_TICK_MS", default_tick_ms)?;
        if tick_ms == 0 {
            return Err(ConfigError::InvalidValue("DISPATCH_TICK_MS", "0".to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
                monitor_tag: lookup("MONITOR_TAG").unwrap_or_else(default_monitor_tag),
            },
            gateway: GatewayConfig {
                url: lookup("GATEWAY_URL").unwrap_or_else(default_gateway_url),
                token,
                intents: parse_or(&lookup, "GATEWAY_INTENTS", default_intents)?,
                properties: ClientPropertiesConfig {
                    os: lookup("GATEWAY_CLIENT_OS").unwrap_or_else(|| env::consts::OS.to_string()),
                    browser: lookup("GATEWAY_CLIENT_BROWSER").unwrap_or_else(default_client_name),
                    device: lookup("GATEWAY_CLIENT_DEVICE").unwrap_or_else(default_client_name),
                },
                filtered_events: lookup("GATEWAY_FILTERED_EVENTS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|e| !e.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(default_filtered_events),
                resume: parse_bool(&lookup, "GATEWAY_RESUME")?,
            },
            dispatch: DispatchConfig { tick_ms },
            reconnect: ReconnectConfig {
                strategy,
                delay_ms: parse_or(&lookup, "RECONNECT_DELAY_MS", default_reconnect_delay_ms)?,
                max_delay_ms: parse_or(
                    &lookup,
                    "RECONNECT_MAX_DELAY_MS",
                    default_reconnect_max_delay_ms,
                )?,
                max_attempts: lookup("RECONNECT_MAX_ATTEMPTS")
                    .map(|s| {
                        s.parse()
                            .map_err(|_| ConfigError::InvalidValue("RECONNECT_MAX_ATTEMPTS", s))
                    })
                    .transpose()?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue(key, s)),
        None => Ok(default()),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(false),
        Some(s) => match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key, s)),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
