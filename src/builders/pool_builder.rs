//! Builders to construct the pool and tickers from configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::{EngineConfig, TickerConfig};
use crate::core::{SchedulerError, TaskPool};
use crate::ticker::Ticker;

/// Build a stopped [`TaskPool`] from engine configuration.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] if validation fails.
pub fn build_pool(cfg: &EngineConfig) -> Result<TaskPool, SchedulerError> {
    TaskPool::new(cfg.pool.clone())
}

/// Build a stopped [`TaskPool`] and the named [`Ticker`]s from engine
/// configuration, resolving each ticker's callback through the provided
/// factory.
///
/// The factory receives the ticker name and its configuration; returning
/// `None` means no callback is known for that name, which fails the build.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] if validation fails, or
/// [`SchedulerError::MissingCallback`] naming the first ticker the factory
/// declined.
pub fn build_engine<F>(
    cfg: &EngineConfig,
    mut callback_factory: F,
) -> Result<(TaskPool, HashMap<String, Ticker>), SchedulerError>
where
    F: FnMut(&str, &TickerConfig) -> Option<Box<dyn Fn() + Send + Sync>>,
{
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let pool = TaskPool::new(cfg.pool.clone())?;
    let mut tickers = HashMap::new();
    for (name, ticker_cfg) in &cfg.tickers {
        let Some(on_tick) = callback_factory(name, ticker_cfg) else {
            return Err(SchedulerError::MissingCallback(name.clone()));
        };
        let ticker = Ticker::new(on_tick, Duration::from_millis(ticker_cfg.interval_ms));
        tickers.insert(name.clone(), ticker);
    }

    Ok((pool, tickers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pool_and_named_tickers() {
        let cfg = EngineConfig::from_json_str(
            r#"{
                "pool": { "worker_count": 1 },
                "tickers": { "heartbeat": { "interval_ms": 100 } }
            }"#,
        )
        .unwrap();

        let (pool, tickers) = build_engine(&cfg, |_, _| Some(Box::new(|| {}))).unwrap();
        assert!(!pool.is_running());
        assert_eq!(tickers.len(), 1);
        assert!(!tickers["heartbeat"].is_running());
    }

    #[test]
    fn missing_callback_names_the_ticker() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "tickers": { "orphan": { "interval_ms": 50 } } }"#,
        )
        .unwrap();

        let err = build_engine(&cfg, |_, _| None).unwrap_err();
        assert!(matches!(err, SchedulerError::MissingCallback(name) if name == "orphan"));
    }
}
