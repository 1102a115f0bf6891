//! Pipeline configuration that the driver and CLI can serialize/deserialize.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Queue capacity. Must be positive; validated when the queue is built.
    pub capacity: i64,

    /// Optional upper bound on each blocking `put` issued by the producer.
    pub put_timeout_ms: Option<u64>,

    /// Optional upper bound on each blocking `take` issued by the consumer.
    pub take_timeout_ms: Option<u64>,

    /// Prefix for the producer/consumer thread names.
    pub thread_name_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            put_timeout_ms: None,
            take_timeout_ms: None,
            thread_name_prefix: "conveyor".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `CONVEYOR_CAPACITY`: queue capacity
    /// - `CONVEYOR_PUT_TIMEOUT_MS`: per-`put` timeout in milliseconds
    /// - `CONVEYOR_TAKE_TIMEOUT_MS`: per-`take` timeout in milliseconds
    /// - `CONVEYOR_THREAD_PREFIX`: thread name prefix
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("CONVEYOR_CAPACITY") {
            if let Ok(v) = s.trim().parse::<i64>() {
                cfg.capacity = v;
            }
        }

        if let Ok(s) = std::env::var("CONVEYOR_PUT_TIMEOUT_MS") {
            if let Ok(v) = s.trim().parse::<u64>() {
                cfg.put_timeout_ms = Some(v);
            }
        }

        if let Ok(s) = std::env::var("CONVEYOR_TAKE_TIMEOUT_MS") {
            if let Ok(v) = s.trim().parse::<u64>() {
                cfg.take_timeout_ms = Some(v);
            }
        }

        if let Ok(s) = std::env::var("CONVEYOR_THREAD_PREFIX") {
            if !s.trim().is_empty() {
                cfg.thread_name_prefix = s.trim().to_string();
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the queue would refuse, before any thread is started.
    pub fn validate(&self) -> Result<()> {
        if self.capacity <= 0 {
            return Err(Error::InvalidCapacity {
                requested: self.capacity,
            });
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(Error::Config(
                "thread name prefix must not contain NUL bytes".into(),
            ));
        }
        Ok(())
    }

    pub fn put_timeout(&self) -> Option<Duration> {
        self.put_timeout_ms.map(Duration::from_millis)
    }

    pub fn take_timeout(&self) -> Option<Duration> {
        self.take_timeout_ms.map(Duration::from_millis)
    }
}
