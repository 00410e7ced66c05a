//! # monitor-common
//!
//! Shared utilities including configuration, credentials, error handling, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::BotToken;
pub use config::{
    AppConfig, AppSettings, ClientPropertiesConfig, ConfigError, DispatchConfig, Environment,
    GatewayConfig, ReconnectConfig, ReconnectStrategyKind,
};
pub use error::AppError;
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
