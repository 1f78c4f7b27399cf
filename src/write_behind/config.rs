use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("flush interval must be greater than zero")]
    ZeroInterval,
    #[error("staleness multiplier must be at least 1")]
    ZeroMultiplier,
    #[error("notification queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("flush interval times staleness multiplier does not fit the clock")]
    IntervalTooLarge,
}

/// Tuning for the write-behind scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteBehindConfig {
    /// Period of the flush timer.
    pub flush_interval: Duration,
    /// How many flush intervals an account must stay untouched before it is
    /// written back.
    pub staleness_multiplier: u32,
    /// Capacity of the touch notification queue.
    pub queue_capacity: usize,
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        WriteBehindConfig {
            flush_interval: Duration::from_secs(60),
            staleness_multiplier: 2,
            queue_capacity: 10_000,
        }
    }
}

impl WriteBehindConfig {
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_staleness_multiplier(mut self, multiplier: u32) -> Self {
        self.staleness_multiplier = multiplier;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Minimum quiet time before a dirty account is flushed.
    pub fn staleness(&self) -> Duration {
        self.flush_interval
            .saturating_mul(self.staleness_multiplier)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.staleness_multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        // Deadlines are computed as now + interval and compared against the
        // staleness window, so both must be representable.
        self.flush_interval
            .checked_mul(self.staleness_multiplier)
            .and_then(|staleness| Instant::now().checked_add(staleness))
            .ok_or(ConfigError::IntervalTooLarge)?;
        Ok(())
    }
}
