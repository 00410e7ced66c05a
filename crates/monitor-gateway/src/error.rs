//! Gateway error types

use serde::Serialize;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Inbound frame was not valid JSON or lacked an op code
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// Hello frame without a usable heartbeat interval
    #[error("Invalid Hello payload: {0}")]
    InvalidHello(String),

    /// Outbound frame could not be serialized
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Socket-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// Send attempted while the socket is not open
    #[error("Socket is not open")]
    SocketClosed,
}

impl GatewayError {
    /// Default notification kind for this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) | Self::InvalidHello(_) => ErrorKind::Decode,
            Self::Encode(_) | Self::SocketClosed => ErrorKind::Session,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Category attached to error notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed inbound frame; the connection stays open
    Decode,
    /// Heartbeat could not be sent
    Heartbeat,
    /// Identify or Resume could not be sent
    Identify,
    /// Socket open, read or close failure; a reconnect follows
    Transport,
    /// Session lifecycle problem (duplicate start, retry ceiling reached)
    Session,
}

impl ErrorKind {
    /// Stable name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "PARSE_ERROR",
            Self::Heartbeat => "HEARTBEAT",
            Self::Identify => "IDENTIFY",
            Self::Transport => "TRANSPORT",
            Self::Session => "SESSION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
