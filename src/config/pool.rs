//! Pool and ticker configuration structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPoolConfig {
    /// Number of worker threads spawned on start (and on lazy start).
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// How long a worker waits on an empty queue before it shuts the whole
    /// pool down, in milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Default sampling interval for sustained-condition checks, in
    /// milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

const fn default_idle_timeout_ms() -> u64 {
    5_000
}

const fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            idle_timeout_ms: default_idle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TaskPoolConfig {
    /// Create a configuration with the defaults (hardware parallelism,
    /// 5 second idle timeout, 50 ms poll interval).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker thread count.
    #[must_use]
    pub const fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the idle timeout in milliseconds.
    #[must_use]
    pub const fn with_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Set the default sustained-check poll interval in milliseconds.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.idle_timeout_ms == 0 {
            return Err("idle_timeout_ms must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Configuration for one named ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
}

impl TickerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root engine configuration: one pool plus any number of named tickers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker pool configuration.
    #[serde(default)]
    pub pool: TaskPoolConfig,
    /// Map of ticker name to configuration.
    #[serde(default)]
    pub tickers: HashMap<String, TickerConfig>,
}

impl EngineConfig {
    /// Validate the pool and every ticker.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid entry.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))?;
        for (name, ticker) in &self.tickers {
            ticker
                .validate()
                .map_err(|e| format!("ticker `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation failure description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TaskPoolConfig::default().validate().is_ok());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = TaskPoolConfig::new().with_worker_count(0);
        assert!(cfg.validate().unwrap_err().contains("worker_count"));
    }

    #[test]
    fn zero_idle_timeout_rejected() {
        let cfg = TaskPoolConfig::new().with_idle_timeout_ms(0);
        assert!(cfg.validate().unwrap_err().contains("idle_timeout_ms"));
    }

    #[test]
    fn json_round_trip_with_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "pool": { "worker_count": 2 } }"#).unwrap();
        assert_eq!(cfg.pool.worker_count, 2);
        assert_eq!(cfg.pool.idle_timeout_ms, 5_000);
        assert!(cfg.tickers.is_empty());
    }

    #[test]
    fn invalid_ticker_named_in_error() {
        let err = EngineConfig::from_json_str(
            r#"{ "tickers": { "heartbeat": { "interval_ms": 0 } } }"#,
        )
        .unwrap_err();
        assert!(err.contains("heartbeat"));
    }
}
