//! Optional process-wide default pool.
//!
//! Nothing in this crate requires the global: every component works against
//! an explicit, owned [`TaskPool`]. For hosts that want one shared pool
//! without threading a handle everywhere, this module offers exactly one
//! default instance behind an explicit init/teardown pair.

use parking_lot::Mutex;

use crate::config::TaskPoolConfig;
use crate::core::{SchedulerError, TaskPool};

static DEFAULT_POOL: Mutex<Option<TaskPool>> = Mutex::new(None);

/// Install the process-wide default pool from the given configuration.
///
/// No-op if a default is already installed (the existing instance wins).
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] if the configuration fails
/// validation; the existing default, if any, is left untouched.
pub fn init_default_pool(config: TaskPoolConfig) -> Result<(), SchedulerError> {
    let mut slot = DEFAULT_POOL.lock();
    if slot.is_none() {
        *slot = Some(TaskPool::new(config)?);
    }
    Ok(())
}

/// A handle to the process-wide default pool, if one has been installed.
#[must_use]
pub fn default_pool() -> Option<TaskPool> {
    DEFAULT_POOL.lock().clone()
}

/// Stop and remove the process-wide default pool. No-op if none is installed.
pub fn teardown_default_pool() {
    let pool = DEFAULT_POOL.lock().take();
    if let Some(pool) = pool {
        pool.stop();
    }
}
