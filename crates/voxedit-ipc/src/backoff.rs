//! Reconnect delays.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnect schedule settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Base delay, doubled before every wait, in milliseconds.
    pub initial_delay_ms: u64,
    /// Retrying stops once the next delay would pass this, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

/// Exponential backoff state.
///
/// The delay doubles before each wait, starting from `initial_delay_ms`, and is handed out while
/// it stays within `max_delay_ms`. The defaults give 2 s, 4 s, 8 s and then give up.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: u64,
    retries: u32,
}

impl Backoff {
    /// Fresh schedule.
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current: config.initial_delay_ms,
            retries: 0,
        }
    }

    /// Delay before the next retry, or `None` when retries are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let doubled = self.current.saturating_mul(2);
        if doubled > self.config.max_delay_ms {
            return None;
        }

        self.current = doubled;
        self.retries += 1;
        Some(Duration::from_millis(doubled))
    }

    /// Retries handed out since the last reset.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Start the schedule over.
    pub fn reset(&mut self) {
        self.current = self.config.initial_delay_ms;
        self.retries = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(delays: &[u64]) -> Vec<Option<Duration>> {
        delays.iter().map(|s| Some(Duration::from_secs(*s))).collect()
    }

    #[test]
    fn test_default_schedule() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        let delays: Vec<_> = (0..3).map(|_| backoff.next_delay()).collect();
        assert_eq!(delays, secs(&[2, 4, 8]));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.retries(), 3);
    }

    #[test]
    fn test_reset_after_success() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
        assert_eq!(backoff.retries(), 1);
    }

    #[test]
    fn test_zero_max_never_retries() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 0,
        });
        assert_eq!(backoff.next_delay(), None);
    }
}
