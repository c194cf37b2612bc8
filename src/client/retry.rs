//! Exponential backoff configuration for transient-failure retries.

use std::time::Duration;

/// Retry policy for the grounded generation client.
///
/// `max_retries` counts additional attempts after the first; the total
/// attempt budget is `max_retries + 1`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Backoff before retrying after attempt `attempt` (0-based).
    ///
    /// `min(base_delay * 2^attempt, max_delay)` plus a uniform random jitter
    /// of up to 10% of the capped delay.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;

        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = base.saturating_mul(factor).min(cap);
        let jitter = fastrand::u64(0..=delay / 10);

        Duration::from_millis(delay + jitter)
    }
}
