//! Bounded exponential backoff for profile provisioning.
//!
//! Delay before retry `n` (0-based) is `initial * factor^n`, clamped to
//! `max_delay`. After `max_retries` retries the caller gives up.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            factor: 2,
            max_delay: Duration::from_secs(16),
            max_retries: 3,
        }
    }
}

impl Backoff {
    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            initial: Duration::ZERO,
            factor: 1,
            max_delay: Duration::ZERO,
            max_retries,
        }
    }

    /// `None` once `retry` reaches `max_retries`.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let scaled = self
            .factor
            .checked_pow(retry)
            .and_then(|m| self.initial.checked_mul(m))
            .unwrap_or(self.max_delay);
        Some(scaled.min(self.max_delay))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..).map_while(|retry| self.delay(retry))
    }

    /// Worst-case time spent waiting.
    pub fn total(&self) -> Duration {
        self.delays().sum()
    }
}
