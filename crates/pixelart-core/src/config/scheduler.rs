//! Dual-pipeline scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and capacity settings for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between checks of a rendezvous signal or the shutdown flag.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// How long a channel consumer blocks before re-looping.
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_ms: u64,
    /// Maximum number of payloads buffered in the result channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl SchedulerConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Channel receive timeout as a [`Duration`].
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_millis(self.channel_timeout_ms.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            channel_timeout_ms: default_channel_timeout(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_poll_interval() -> u64 {
    50
}

fn default_channel_timeout() -> u64 {
    3000
}

fn default_channel_capacity() -> usize {
    256
}
