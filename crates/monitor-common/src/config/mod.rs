//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ClientPropertiesConfig, ConfigError, DispatchConfig, Environment,
    GatewayConfig, ReconnectConfig, ReconnectStrategyKind,
};
