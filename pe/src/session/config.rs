//! Timer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::plan::DEFAULT_LOOP_CAP;

/// Configuration for the timer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Repetitions used for groups without an explicit count
    #[serde(rename = "loop-cap", default = "default_loop_cap")]
    pub loop_cap: u32,

    /// Length of one countdown tick in milliseconds
    #[serde(rename = "tick-ms", default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Command channel buffer size for the timer service
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_loop_cap() -> u32 {
    DEFAULT_LOOP_CAP
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_channel_buffer() -> usize {
    64
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            loop_cap: default_loop_cap(),
            tick_ms: default_tick_ms(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl TimerConfig {
    /// Get the tick period as a Duration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TimerConfig::default();
        assert_eq!(config.loop_cap, 99);
        assert_eq!(config.tick_ms, 1000);
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let config = TimerConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick(), Duration::from_millis(1));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: TimerConfig = serde_yaml::from_str("loop-cap: 4").unwrap();
        assert_eq!(config.loop_cap, 4);
        assert_eq!(config.tick_ms, 1000);
    }
}
