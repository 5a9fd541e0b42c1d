//! Configuration models for the pool and tickers.

pub mod pool;

pub use pool::{EngineConfig, TaskPoolConfig, TickerConfig};
