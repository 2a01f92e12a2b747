//! Timing configuration for the scheduler loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs of the control loop.
///
/// Defaults: 30 s retry after a failed check, at most 1 s per wait, 5 s
/// bounded join on stop, 1 s minimum interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay before a failed check is retried, in seconds.
    pub retry_delay_secs: u64,
    /// Longest single wait of the loop, in milliseconds.
    pub max_sleep_ms: u64,
    /// How long `stop()` waits for the loop to exit, in seconds.
    pub join_timeout_secs: u64,
    /// Smallest interval accepted from a checker, in seconds.
    pub min_interval_secs: u64,
    /// Pause after an unexpected loop failure, in milliseconds.
    pub error_pause_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: 30,
            max_sleep_ms: 1_000,
            join_timeout_secs: 5,
            min_interval_secs: 1,
            error_pause_ms: 1_000,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry delay after a failed check.
    #[must_use]
    pub const fn with_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    /// Set the longest single wait of the loop.
    #[must_use]
    pub const fn with_max_sleep_ms(mut self, ms: u64) -> Self {
        self.max_sleep_ms = ms;
        self
    }

    /// Set the bounded join timeout used by `stop()`.
    #[must_use]
    pub const fn with_join_timeout_secs(mut self, secs: u64) -> Self {
        self.join_timeout_secs = secs;
        self
    }

    /// Set the minimum interval accepted from a checker.
    #[must_use]
    pub const fn with_min_interval_secs(mut self, secs: u64) -> Self {
        self.min_interval_secs = secs;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.retry_delay_secs == 0 {
            return Err("retry_delay_secs must be greater than 0".into());
        }
        if self.max_sleep_ms == 0 {
            return Err("max_sleep_ms must be greater than 0".into());
        }
        if self.min_interval_secs == 0 {
            return Err("min_interval_secs must be greater than 0".into());
        }
        if self.error_pause_ms == 0 {
            return Err("error_pause_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Retry delay as a `Duration`.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Longest single wait as a `Duration`.
    #[must_use]
    pub const fn max_sleep(&self) -> Duration {
        Duration::from_millis(self.max_sleep_ms)
    }

    /// Join timeout as a `Duration`.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    /// Error pause as a `Duration`.
    #[must_use]
    pub const fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }
}
