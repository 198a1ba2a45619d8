//! Broadcast sink configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::bus::DEFAULT_CHANNEL_CAPACITY;

/// Configuration for the optional broadcast sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Start the TCP sink with `pe watch`
    #[serde(default)]
    pub enabled: bool,

    /// Address the TCP sink listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Events buffered per subscriber before it starts lagging
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Append every broadcast event to this JSONL file
    #[serde(rename = "event-log", default)]
    pub event_log: Option<PathBuf>,
}

fn default_bind() -> String {
    "127.0.0.1:8765".to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_bind(),
            channel_capacity: default_channel_capacity(),
            event_log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BroadcastConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.bind, "127.0.0.1:8765");
        assert_eq!(config.event_log, None);
    }

    #[test]
    fn test_yaml_kebab_case_fields() {
        let yaml = "enabled: true\nchannel-capacity: 16\nevent-log: /tmp/pe.jsonl\n";
        let config: BroadcastConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.event_log, Some(PathBuf::from("/tmp/pe.jsonl")));
        assert_eq!(config.bind, "127.0.0.1:8765");
    }
}
