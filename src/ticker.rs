//! A single-thread periodic invoker with pause, resume, and live interval
//! update.
//!
//! The `Ticker` shares nothing with [`crate::core::pool::TaskPool`]: it owns
//! one dedicated thread that invokes the callback strictly one-at-a-time.
//! Pausing preserves progress toward the next tick (the remaining wait is
//! decremented by the time elapsed before the pause, not reset), and a live
//! interval update while unpaused discards the partial countdown and re-arms
//! with the new interval immediately.
//!
//! A panic inside the tick callback is fatal to the ticker: it stops and
//! stays silent until `start()` is called again. This is deliberately
//! asymmetric with the task pool's per-task panic isolation — a periodic
//! callback that panics once will usually panic every tick.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

/// Mutable ticker state behind the ticker's lock.
///
/// Invariant: `remaining` never exceeds the interval it was armed from.
/// `epoch` increments on every start so a superseded loop thread can tell it
/// has been replaced and wind down.
struct TickerState {
    running: bool,
    paused: bool,
    interval: Duration,
    remaining: Duration,
    epoch: u64,
    /// Bumped by a live (unpaused) interval update so an in-flight countdown
    /// knows to re-arm even when the new remaining equals the old.
    rearm_gen: u64,
}

struct TickerInner {
    on_tick: Box<dyn Fn() + Send + Sync>,
    state: Mutex<TickerState>,
    wake: Condvar,
}

/// A pausable periodic invoker backed by one dedicated thread.
///
/// Constructed with a callback and an interval; does not tick until
/// [`start`](Self::start) is called. At most one loop thread exists per
/// instance at any time, and `on_tick` invocations never overlap. Dropping
/// the ticker stops it.
pub struct Ticker {
    inner: Arc<TickerInner>,
    /// Loop thread handle, kept outside the state lock so joining never
    /// blocks state access from the loop itself.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    /// Create a ticker that invokes `on_tick` every `interval` once started.
    pub fn new<F>(on_tick: F, interval: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(TickerInner {
                on_tick: Box::new(on_tick),
                state: Mutex::new(TickerState {
                    running: false,
                    paused: false,
                    interval,
                    remaining: interval,
                    epoch: 0,
                    rearm_gen: 0,
                }),
                wake: Condvar::new(),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Start ticking. No-op if already running.
    ///
    /// Any previous loop thread (finished after a stop or a callback panic)
    /// is joined first, unless `start` is being called from that very thread,
    /// in which case the old handle is detached and the superseded loop winds
    /// down on its own.
    pub fn start(&self) {
        let spawn_epoch = {
            let mut state = self.inner.state.lock();
            if state.running {
                return;
            }
            state.epoch += 1;
            state.running = true;
            state.paused = false;
            state.remaining = state.interval;
            state.epoch
        };

        let previous = { self.thread.lock().take() };
        if let Some(handle) = previous {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
            // Same-thread restart (from inside on_tick): dropping the handle
            // detaches it; the old loop exits once it sees the new epoch.
        }

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name("delay-pool-ticker".into())
            .spawn(move || run_loop(&inner, spawn_epoch))
            .expect("failed to spawn ticker thread");
        *self.thread.lock() = Some(handle);
    }

    /// Stop ticking and join the loop thread.
    ///
    /// Safe to call from inside the tick callback: the calling thread's own
    /// handle is detached instead of self-joined, and the loop exits once the
    /// callback returns. Also reaps a leftover finished thread when the
    /// ticker is already stopped.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.running {
                state.running = false;
                state.paused = false;
            }
        }
        self.inner.wake.notify_all();

        let handle = { self.thread.lock().take() };
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let _ = handle.join();
        }
    }

    /// Suspend ticking, preserving progress toward the next tick. No-op if
    /// not running or already paused.
    pub fn pause(&self) {
        {
            let mut state = self.inner.state.lock();
            if !state.running || state.paused {
                return;
            }
            state.paused = true;
        }
        // Wake the loop so it banks the elapsed portion of the countdown now
        // rather than at the next tick boundary.
        self.inner.wake.notify_all();
    }

    /// Resume ticking after a pause; the next tick fires after whatever
    /// remained of the interval when the pause took effect. No-op if not
    /// running or not paused.
    pub fn resume(&self) {
        {
            let mut state = self.inner.state.lock();
            if !state.running || !state.paused {
                return;
            }
            state.paused = false;
        }
        self.inner.wake.notify_all();
    }

    /// Replace the tick interval.
    ///
    /// While unpaused this takes effect immediately: the partial countdown
    /// toward the old interval is discarded and the loop re-arms with the new
    /// one. While paused only the interval is replaced; the banked remaining
    /// time still governs the first tick after resume.
    pub fn update_interval(&self, new_interval: Duration) {
        {
            let mut state = self.inner.state.lock();
            state.interval = new_interval;
            if !state.paused {
                state.remaining = new_interval;
                state.rearm_gen += 1;
            }
        }
        self.inner.wake.notify_all();
    }

    /// Whether the ticker is currently running (paused still counts).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Whether the ticker is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Ticker")
            .field("running", &state.running)
            .field("paused", &state.paused)
            .field("interval", &state.interval)
            .finish()
    }
}

/// Why the tick thread stopped waiting.
enum Wake {
    /// The full remaining interval elapsed: a real tick.
    Tick,
    /// Paused mid-countdown; bank the progress.
    Pause,
    /// Stopped or superseded by a newer loop.
    Stop,
    /// The interval was updated live; re-arm with the new remaining time.
    Rearm,
}

fn run_loop(inner: &Arc<TickerInner>, my_epoch: u64) {
    debug!("ticker loop started");
    let mut state = inner.state.lock();
    while state.running && state.epoch == my_epoch {
        if state.paused {
            // Unbounded wait until resumed or stopped.
            inner.wake.wait(&mut state);
            continue;
        }

        let start = Instant::now();
        let armed = state.remaining;
        let armed_gen = state.rearm_gen;
        let deadline = start + armed;
        let wake = loop {
            let timed_out = inner.wake.wait_until(&mut state, deadline).timed_out();
            if !state.running || state.epoch != my_epoch {
                break Wake::Stop;
            }
            if state.paused {
                break Wake::Pause;
            }
            if state.rearm_gen != armed_gen {
                break Wake::Rearm;
            }
            if timed_out {
                break Wake::Tick;
            }
            // Spurious wakeup: keep waiting on the same deadline.
        };

        match wake {
            Wake::Stop => break,
            Wake::Pause => {
                // Progress is preserved across the pause, not reset.
                state.remaining = armed.saturating_sub(start.elapsed());
            }
            Wake::Rearm => {}
            Wake::Tick => {
                drop(state);
                let panicked =
                    panic::catch_unwind(AssertUnwindSafe(|| (inner.on_tick)())).is_err();
                state = inner.state.lock();
                if panicked {
                    // One bad tick halts the stream until an explicit start.
                    error!("tick callback panicked, stopping ticker");
                    state.running = false;
                    state.paused = false;
                    break;
                }
                state.remaining = state.interval;
            }
        }
    }
    debug!("ticker loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn does_not_tick_before_start() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t2 = Arc::clone(&ticks);
        let ticker = Ticker::new(
            move || {
                t2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        );
        assert!(!ticker.is_running());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn start_and_stop_transitions() {
        let ticker = Ticker::new(|| {}, Duration::from_millis(20));
        ticker.start();
        assert!(ticker.is_running());
        ticker.start();
        assert!(ticker.is_running());
        ticker.stop();
        assert!(!ticker.is_running());
        ticker.stop();
        assert!(!ticker.is_running());
    }

    #[test]
    fn pause_and_resume_flags() {
        let ticker = Ticker::new(|| {}, Duration::from_millis(50));
        ticker.pause();
        assert!(!ticker.is_paused());
        ticker.start();
        ticker.pause();
        assert!(ticker.is_paused());
        assert!(ticker.is_running());
        ticker.resume();
        assert!(!ticker.is_paused());
        ticker.stop();
    }

    #[test]
    fn ticks_accumulate_while_running() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t2 = Arc::clone(&ticks);
        let ticker = Ticker::new(
            move || {
                t2.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(10),
        );
        ticker.start();
        thread::sleep(Duration::from_millis(100));
        ticker.stop();
        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 3, "expected several ticks, got {seen}");
        let after_stop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }
}
