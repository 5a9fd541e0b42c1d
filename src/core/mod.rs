//! Core scheduling abstractions: the delay queue, the worker pool, and the
//! sustained-condition helper built on top of it.

pub mod error;
pub mod pool;
pub mod sustain;
pub mod task;

pub use error::{AppResult, SchedulerError};
pub use pool::TaskPool;
pub use task::{DelayQueue, ScheduledTask, Work};
