//! Gateway connection management
//!
//! The session actor, its reconnect policy and the handle callers use to drive it.

mod config;
mod monitor;
mod policy;
mod resume;
mod sender;
mod session;
mod state;

pub use config::{SessionConfig, DEFAULT_GATEWAY_URL};
pub use monitor::GatewayMonitor;
pub use policy::{ReconnectPolicy, ReconnectStrategy};
pub use sender::FrameSender;
pub use state::{SessionState, StateCell};
