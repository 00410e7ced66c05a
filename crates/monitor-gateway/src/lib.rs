//! # monitor-gateway
//!
//! Keeps a live connection to a push-based event gateway and hands received
//! events to the application one at a time on a fixed cadence.
//!
//! ```no_run
//! use monitor_gateway::{GatewayMonitor, Notification, SessionConfig, DEFAULT_GATEWAY_URL};
//!
//! # async fn demo() {
//! let (monitor, mut notifications) =
//!     GatewayMonitor::new(SessionConfig::new(DEFAULT_GATEWAY_URL, "bot-token"));
//! monitor.start_monitoring("m1");
//!
//! while let Some(notification) = notifications.recv().await {
//!     if let Notification::Event(event) = notification {
//!         println!("{}", event.event_type);
//!     }
//! }
//! monitor.stop_monitoring("m1").await;
//! # }
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod protocol;

pub use broadcast::{IngestionQueue, QueueStats, QueuedEvent, RateLimitedDispatcher};
pub use connection::{
    GatewayMonitor, ReconnectPolicy, ReconnectStrategy, SessionConfig, SessionState,
    DEFAULT_GATEWAY_URL,
};
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use events::{EventSummary, Notification, NotificationReceiver};
pub use heartbeat::HeartbeatScheduler;
pub use protocol::{FrameCodec, GatewayIntents, IdentifyProperties};
