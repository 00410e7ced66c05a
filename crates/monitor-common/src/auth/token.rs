//! Bot token
//!
//! Opaque credential presented to the gateway in the Identify handshake.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Opaque bot credential.
///
/// Cheap to clone so one token can be handed to every component that needs it.
/// `Debug` and `Display` never reveal the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken(Arc<str>);

impl BotToken {
    /// Wrap a raw token string
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Raw token, for building the Identify payload only
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if the token is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(***)")
    }
}

impl fmt::Display for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl Serialize for BotToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.expose())
    }
}

impl From<&str> for BotToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BotToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
