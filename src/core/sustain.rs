//! Sustained-condition checks built on top of [`TaskPool::submit`].
//!
//! "Run `action` once `condition` has held continuously for `duration`" is
//! implemented by re-submitting a small check value to the pool at a fixed
//! poll interval, carrying the original start time forward. The condition is
//! sampled only at poll boundaries: a flip between two polls is invisible,
//! which trades accuracy for latency deliberately.
//!
//! The check is an explicit state value re-submitted by value on each poll,
//! not a self-referential closure, so there are no ownership cycles.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::pool::TaskPool;

/// Poll state for one `when_sustained` invocation. Moved into each submitted
/// closure and re-submitted whole until it resolves one way or the other.
struct SustainedCheck<C, F> {
    started: Instant,
    condition: C,
    action: F,
    duration: Duration,
    poll_interval: Duration,
}

impl<C, F> SustainedCheck<C, F>
where
    C: Fn() -> bool + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    fn schedule(self, pool: TaskPool, delay: Duration) {
        let resubmit = pool.clone();
        pool.submit(move || self.poll(resubmit), delay);
    }

    fn poll(self, pool: TaskPool) {
        if !(self.condition)() {
            // One false sample aborts the whole check; the action never runs.
            debug!("sustained condition broke, dropping check");
            return;
        }
        if self.started.elapsed() >= self.duration {
            (self.action)();
            return;
        }
        let delay = self.poll_interval;
        self.schedule(pool, delay);
    }
}

impl TaskPool {
    /// Run `action` once `condition` has been observed true at every poll
    /// across `duration`, using the pool's configured poll interval.
    ///
    /// Fire-once: `action` executes at most one time per call, and only if
    /// no poll ever sees the condition false. The first check is submitted
    /// immediately with zero delay.
    pub fn when_sustained<C, F>(&self, condition: C, duration: Duration, action: F)
    where
        C: Fn() -> bool + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.when_sustained_with_poll(condition, duration, action, self.poll_interval());
    }

    /// [`when_sustained`](Self::when_sustained) with an explicit poll
    /// interval.
    pub fn when_sustained_with_poll<C, F>(
        &self,
        condition: C,
        duration: Duration,
        action: F,
        poll_interval: Duration,
    ) where
        C: Fn() -> bool + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let check = SustainedCheck {
            started: Instant::now(),
            condition,
            action,
            duration,
            poll_interval,
        };
        check.schedule(self.clone(), Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn false_condition_never_fires() {
        let pool = TaskPool::with_defaults();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        pool.when_sustained_with_poll(
            || false,
            Duration::from_millis(50),
            move || {
                fired2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        );
        thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        pool.stop();
    }

    #[test]
    fn held_condition_fires_exactly_once() {
        let pool = TaskPool::with_defaults();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        pool.when_sustained_with_poll(
            || true,
            Duration::from_millis(40),
            move || {
                fired2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        );
        thread::sleep(Duration::from_millis(200));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        pool.stop();
    }
}
