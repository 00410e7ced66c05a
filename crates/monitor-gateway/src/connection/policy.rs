//! Reconnect policy

use monitor_common::{ReconnectConfig, ReconnectStrategyKind};
use std::time::Duration;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectStrategy {
    /// Same delay every time
    Fixed,
    /// `base * 2^attempt`, capped at `max`
    Exponential { max: Duration },
}

/// Delay schedule and attempt ceiling for reconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub strategy: ReconnectStrategy,
    pub base: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Fixed delay with unbounded retries
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: ReconnectStrategy::Fixed,
            base: delay,
            max_attempts: None,
        }
    }

    /// Doubling delay capped at `max`, unbounded retries
    #[must_use]
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self {
            strategy: ReconnectStrategy::Exponential { max },
            base,
            max_attempts: None,
        }
    }

    /// Set the attempt ceiling
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the zero-based `attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            ReconnectStrategy::Fixed => self.base,
            ReconnectStrategy::Exponential { max } => {
                let factor = 2u32.saturating_pow(attempt);
                self.base.saturating_mul(factor).min(max)
            }
        }
    }

    /// Check if `attempt` is past the ceiling
    #[must_use]
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(5), Duration::from_secs(60))
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        let base = Duration::from_millis(config.delay_ms);
        let policy = match config.strategy {
            ReconnectStrategyKind::Fixed => Self::fixed(base),
            ReconnectStrategyKind::Exponential => {
                Self::exponential(base, Duration::from_millis(config.max_delay_ms))
            }
        };
        policy.with_max_attempts(config.max_attempts)
    }
}
