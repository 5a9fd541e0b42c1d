//! # Delay Pool
//!
//! Deferred and periodic execution primitives: a time-ordered task scheduler
//! backed by a worker pool, plus a standalone pausable ticker.
//!
//! Host applications submit closures to run later — once, after a delay, or
//! repeatedly — without blocking their own control flow. Both components
//! behave correctly under concurrent submission, pause/resume, interval
//! change, and shutdown.
//!
//! ## Components
//!
//! - [`core::TaskPool`] — owns a min-ordered delay queue and a fixed set of
//!   worker threads. Submission never fails (a stopped pool lazy-starts),
//!   `stop` discards pending work, and an idle pool shuts itself down after
//!   a bounded timeout.
//! - [`core::TaskPool::when_sustained`] — runs an action once a condition
//!   has held continuously for a duration, sampled at a poll interval.
//! - [`ticker::Ticker`] — a single-thread periodic invoker with pause,
//!   resume, and live interval update; shares no state with the pool.
//!
//! ## Example
//!
//! ```rust,ignore
//! use delay_pool::config::TaskPoolConfig;
//! use delay_pool::core::TaskPool;
//! use delay_pool::ticker::Ticker;
//! use std::time::Duration;
//!
//! let pool = TaskPool::new(TaskPoolConfig::new().with_worker_count(4))?;
//! pool.submit(|| println!("ran 10ms later"), Duration::from_millis(10));
//!
//! pool.when_sustained(
//!     || sensor_is_hot(),
//!     Duration::from_millis(200),
//!     || println!("sensor held hot for 200ms"),
//! );
//!
//! let ticker = Ticker::new(|| println!("tick"), Duration::from_millis(100));
//! ticker.start();
//! ticker.pause();
//! ticker.resume();
//! ticker.stop();
//! ```
//!
//! Failures inside submitted work are caught and logged; one failing task
//! never kills a worker. A failing tick callback, by contrast, stops its
//! ticker until restarted — see the module docs for the reasoning.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Configuration models for the pool and tickers.
pub mod config;
/// Core scheduling: delay queue, worker pool, sustained-condition helper.
pub mod core;
/// Optional process-wide default pool behind explicit init/teardown.
pub mod global;
/// The standalone pausable periodic ticker.
pub mod ticker;
/// Shared utilities.
pub mod util;

pub use crate::core::{SchedulerError, TaskPool};
pub use crate::ticker::Ticker;
