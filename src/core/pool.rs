//! Worker pool scheduler draining a shared delay queue.
//!
//! `TaskPool` owns a [`DelayQueue`] plus a set of worker threads. Callers
//! submit zero-argument closures with a delay; each worker pops due tasks
//! and executes them with the pool lock released, so long tasks never block
//! siblings.
//!
//! # Design
//!
//! - **One lock, one condvar**: all mutable state (`running`, queue, worker
//!   handles) lives behind a single `parking_lot::Mutex`; workers park on the
//!   paired `Condvar` until the earliest due time, a new submission, or stop.
//! - **No lock across callbacks**: task execution happens with the lock
//!   released, so a task may safely re-enter the pool (submit, stop).
//! - **Idle self-shutdown**: a worker that sees an empty queue for the whole
//!   idle timeout collapses the pool. The `running` flag is shared, so its
//!   siblings observe the stop and exit with it. A later `submit` lazily
//!   restarts the pool.
//! - **Per-task panic isolation**: a panicking task is caught and logged;
//!   the worker keeps draining the queue.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::TaskPoolConfig;
use crate::core::error::SchedulerError;
use crate::core::task::{DelayQueue, ScheduledTask};

/// Mutable pool state. Worker handles are tracked under the same lock as the
/// `running` flag so start/stop and the workers themselves agree on both.
struct PoolState {
    running: bool,
    queue: DelayQueue,
    workers: Vec<JoinHandle<()>>,
}

struct Inner {
    state: Mutex<PoolState>,
    wake: Condvar,
    idle_timeout: Duration,
    default_workers: usize,
    poll_interval: Duration,
}

/// A time-ordered task scheduler backed by a fixed set of worker threads.
///
/// `TaskPool` is a cheap, cloneable handle; clones share the same pool. It is
/// an explicit, owned instance — pass it (or a clone) to whatever needs to
/// schedule work. A process-wide default is available separately through
/// [`crate::global`] but nothing requires it.
///
/// Submission never fails: submitting to a stopped pool lazily starts it with
/// the default worker count. `stop` discards pending tasks rather than
/// draining them. A pool left with nothing to do shuts itself down after the
/// configured idle timeout without an explicit `stop` call; the collapse
/// takes every worker with it, not just the idle one.
#[derive(Clone)]
pub struct TaskPool {
    inner: Arc<Inner>,
}

impl TaskPool {
    /// Create a pool from a validated configuration. No workers are spawned
    /// until [`start`](Self::start) or the first [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(config: TaskPoolConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self::from_validated(&config))
    }

    /// Create a pool with the default configuration (hardware-parallelism
    /// worker count, 5 second idle timeout).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::from_validated(&TaskPoolConfig::default())
    }

    fn from_validated(config: &TaskPoolConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(PoolState {
                    running: false,
                    queue: DelayQueue::new(),
                    workers: Vec::new(),
                }),
                wake: Condvar::new(),
                idle_timeout: Duration::from_millis(config.idle_timeout_ms),
                default_workers: config.worker_count,
                poll_interval: Duration::from_millis(config.poll_interval_ms),
            }),
        }
    }

    /// Start the pool with `workers` threads (`0` means the configured
    /// default). No-op if the pool is already running.
    pub fn start(&self, workers: usize) {
        let mut state = self.inner.state.lock();
        self.start_locked(&mut state, workers);
    }

    fn start_locked(&self, state: &mut PoolState, workers: usize) {
        if state.running {
            return;
        }
        // Workers that exited through the idle path left their handles
        // behind; reclaim them here so restarts do not accumulate handles.
        state.workers.retain(|handle| !handle.is_finished());
        state.running = true;
        let count = if workers == 0 {
            self.inner.default_workers
        } else {
            workers
        };
        for worker_id in 0..count {
            state.workers.push(self.spawn_worker(worker_id));
        }
        info!(workers = count, "task pool started");
    }

    fn spawn_worker(&self, worker_id: usize) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name(format!("delay-pool-worker-{worker_id}"))
            .spawn(move || worker_loop(&inner, worker_id))
            .expect("failed to spawn worker thread")
    }

    /// Schedule `work` to run no earlier than `delay` from now.
    ///
    /// If the pool is not running it is started with the default worker
    /// count first, so submission never fails. Arguments are whatever the
    /// closure captures; no result is propagated back, and a panic inside
    /// `work` is caught and logged by the executing worker.
    pub fn submit<F>(&self, work: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        let due = Instant::now() + delay;
        {
            let mut state = self.inner.state.lock();
            if !state.running {
                debug!("submit on a stopped pool, lazy-starting");
                self.start_locked(&mut state, 0);
            }
            state.queue.push(due, Box::new(work));
        }
        self.inner.wake.notify_one();
    }

    /// Stop the pool and join its workers.
    ///
    /// Pending tasks are dropped, not executed. When called from inside a
    /// running task, the calling worker's own handle is detached instead of
    /// self-joined.
    pub fn stop(&self) {
        let handles = {
            let mut state = self.inner.state.lock();
            if !state.running && state.workers.is_empty() {
                return;
            }
            state.running = false;
            state.queue.clear();
            std::mem::take(&mut state.workers)
        };
        self.inner.wake.notify_all();

        let caller = thread::current().id();
        for handle in handles {
            if handle.thread().id() == caller {
                // Re-entrant stop from a task running on this very worker:
                // dropping the handle detaches it rather than deadlocking.
                continue;
            }
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
        info!("task pool stopped");
    }

    /// Whether the pool currently has running workers.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Whether any task is queued and not yet popped by a worker.
    ///
    /// A task already executing does not count as pending.
    #[must_use]
    pub fn has_pending_task(&self) -> bool {
        !self.inner.state.lock().queue.is_empty()
    }

    /// Default poll interval for sustained-condition checks.
    pub(crate) fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("TaskPool")
            .field("running", &state.running)
            .field("pending", &state.queue.len())
            .field("workers", &state.workers.len())
            .finish()
    }
}

/// The per-thread scheduling loop.
///
/// Invariants: the lock is held everywhere except across task execution, and
/// a popped task runs on exactly one worker.
fn worker_loop(inner: &Arc<Inner>, worker_id: usize) {
    debug!(worker = worker_id, "worker started");
    let mut state = inner.state.lock();
    loop {
        if !state.running && state.queue.is_empty() {
            break;
        }

        let Some(due) = state.queue.next_due() else {
            // Running with an empty queue: wait, but only for so long.
            let deadline = Instant::now() + inner.idle_timeout;
            let idle = loop {
                let timed_out = inner.wake.wait_until(&mut state, deadline).timed_out();
                if !state.running || !state.queue.is_empty() {
                    break false;
                }
                if timed_out {
                    break true;
                }
            };
            if idle {
                // Nothing arrived for the whole idle timeout: collapse the
                // pool. The flag is shared, so sibling workers exit too.
                debug!(worker = worker_id, "idle timeout, pool shutting down");
                state.running = false;
                inner.wake.notify_all();
                break;
            }
            continue;
        };

        if due <= Instant::now() {
            let Some(task) = state.queue.pop() else {
                continue;
            };
            drop(state);
            run_task(task, worker_id);
            state = inner.state.lock();
            continue;
        }

        // Earliest task is still in the future: sleep until it is due or an
        // earlier submission / stop wakes us, then re-examine everything.
        let _ = inner.wake.wait_until(&mut state, due);
    }
    debug!(worker = worker_id, "worker exiting");
}

fn run_task(task: ScheduledTask, worker_id: usize) {
    let lateness = task.due().elapsed();
    debug!(worker = worker_id, ?lateness, "executing task");
    if panic::catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
        warn!(worker = worker_id, "task panicked, worker continues");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn small_pool(workers: usize) -> TaskPool {
        let pool = TaskPool::new(
            TaskPoolConfig::new()
                .with_worker_count(workers)
                .with_idle_timeout_ms(60_000),
        )
        .unwrap();
        pool.start(0);
        pool
    }

    #[test]
    fn submit_executes_work() {
        let pool = small_pool(2);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        pool.submit(
            move || {
                ran2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        );
        thread::sleep(Duration::from_millis(100));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        pool.stop();
    }

    #[test]
    fn submit_lazy_starts_a_stopped_pool() {
        let pool = TaskPool::with_defaults();
        assert!(!pool.is_running());
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        pool.submit(
            move || {
                ran2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::ZERO,
        );
        assert!(pool.is_running());
        thread::sleep(Duration::from_millis(100));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        pool.stop();
    }

    #[test]
    fn start_is_idempotent() {
        let pool = small_pool(1);
        pool.start(4);
        assert!(pool.is_running());
        pool.stop();
        assert!(!pool.is_running());
    }

    #[test]
    fn stop_drops_pending_tasks() {
        let pool = small_pool(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        pool.submit(
            move || {
                ran2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_secs(60),
        );
        assert!(pool.has_pending_task());
        pool.stop();
        assert!(!pool.has_pending_task());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_on_a_never_started_pool_is_a_no_op() {
        let pool = TaskPool::with_defaults();
        pool.stop();
        assert!(!pool.is_running());
    }
}
