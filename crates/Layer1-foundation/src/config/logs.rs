//! Logs Configuration - 로그 집계 타이밍 설정

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the log aggregation engine.
///
/// All durations are stored as milliseconds so the JSON stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsConfig {
    /// Sorting window of the printer
    pub window_ms: u64,

    /// Delay before reopening a stream that ended while following
    pub reconnect_delay_ms: u64,

    /// Delay before retrying a stream that failed to open while following
    pub open_retry_delay_ms: u64,

    /// Raw-line channel slots reserved per source
    pub channel_capacity_per_source: usize,

    /// How often service status is polled
    pub status_poll_interval_ms: u64,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            window_ms: 100,
            reconnect_delay_ms: 500,
            open_retry_delay_ms: 5_000,
            channel_capacity_per_source: 32,
            status_poll_interval_ms: 1_000,
        }
    }
}

/// `logs` section of a single config file. Only the keys the file sets are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsOverrides {
    pub window_ms: Option<u64>,
    pub reconnect_delay_ms: Option<u64>,
    pub open_retry_delay_ms: Option<u64>,
    pub channel_capacity_per_source: Option<usize>,
    pub status_poll_interval_ms: Option<u64>,
}

impl LogsConfig {
    /// Apply the keys a config file sets, one field at a time
    pub fn merge(&mut self, other: LogsOverrides) {
        if let Some(window_ms) = other.window_ms {
            self.window_ms = window_ms;
        }
        if let Some(reconnect_delay_ms) = other.reconnect_delay_ms {
            self.reconnect_delay_ms = reconnect_delay_ms;
        }
        if let Some(open_retry_delay_ms) = other.open_retry_delay_ms {
            self.open_retry_delay_ms = open_retry_delay_ms;
        }
        if let Some(capacity) = other.channel_capacity_per_source {
            self.channel_capacity_per_source = capacity;
        }
        if let Some(interval) = other.status_poll_interval_ms {
            self.status_poll_interval_ms = interval;
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn open_retry_delay(&self) -> Duration {
        Duration::from_millis(self.open_retry_delay_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    /// Zero values would spin or deadlock the engine
    pub fn validate(&self) -> crate::Result<()> {
        if self.window_ms == 0 {
            return Err(crate::Error::Config("logs.windowMs must be > 0".to_string()));
        }
        if self.channel_capacity_per_source == 0 {
            return Err(crate::Error::Config(
                "logs.channelCapacityPerSource must be > 0".to_string(),
            ));
        }
        if self.status_poll_interval_ms == 0 {
            return Err(crate::Error::Config(
                "logs.statusPollIntervalMs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
