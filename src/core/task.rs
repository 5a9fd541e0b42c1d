//! Scheduled tasks and the delay queue that orders them.
//!
//! A [`ScheduledTask`] is a due time paired with a boxed, zero-argument unit
//! of work; callers bind any arguments into the closure at submission time.
//! The [`DelayQueue`] is a min-ordered heap over those tasks: the earliest
//! due task is always popped first.
//!
//! Tasks are immutable once enqueued. They carry no identity and cannot be
//! cancelled; whoever pops a task owns it exclusively.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Instant;

/// The zero-argument unit of work a task executes.
pub type Work = Box<dyn FnOnce() + Send>;

/// A unit of deferred work paired with the instant it becomes due.
pub struct ScheduledTask {
    due: Instant,
    /// Insertion sequence, used to break due-time ties in submission order.
    seq: u64,
    work: Work,
}

impl ScheduledTask {
    /// The instant at or after which this task may execute.
    #[must_use]
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Consume the task and invoke its work.
    pub fn run(self) {
        (self.work)();
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("due", &self.due)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Heap entry with ordering inverted so `BinaryHeap` (a max-heap) yields the
/// earliest due task first. Equal due times compare by insertion sequence,
/// so ties pop in FIFO order and a steady stream of equal-due submissions
/// cannot starve an older task.
struct Entry(ScheduledTask);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0.due == other.0.due && self.0.seq == other.0.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .due
            .cmp(&self.0.due)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

/// A minimum-ordered collection of [`ScheduledTask`]s keyed by due time.
///
/// Not internally synchronized; the owning scheduler guards it with its own
/// lock.
#[derive(Default)]
pub struct DelayQueue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl DelayQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert work due at `due`.
    pub fn push(&mut self, due: Instant, work: Work) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry(ScheduledTask { due, seq, work }));
    }

    /// Remove and return the earliest-due task, if any.
    pub fn pop(&mut self) -> Option<ScheduledTask> {
        self.heap.pop().map(|e| e.0)
    }

    /// The due time of the earliest task without removing it.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|e| e.0.due)
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every queued task without running it.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl fmt::Debug for DelayQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayQueue")
            .field("len", &self.heap.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;
    use std::time::Duration;

    fn noop() -> Work {
        Box::new(|| {})
    }

    #[test]
    fn pops_in_due_time_order() {
        let now = Instant::now();
        let mut q = DelayQueue::new();
        q.push(now + Duration::from_millis(300), noop());
        q.push(now + Duration::from_millis(100), noop());
        q.push(now + Duration::from_millis(200), noop());

        let first = q.pop().unwrap();
        let second = q.pop().unwrap();
        let third = q.pop().unwrap();
        assert_eq!(first.due(), now + Duration::from_millis(100));
        assert_eq!(second.due(), now + Duration::from_millis(200));
        assert_eq!(third.due(), now + Duration::from_millis(300));
        assert!(q.pop().is_none());
    }

    #[test]
    fn equal_due_times_pop_fifo() {
        let due = Instant::now();
        let order = Arc::new(AtomicUsize::new(0));
        let mut q = DelayQueue::new();
        for expected in 0..10 {
            let order = Arc::clone(&order);
            q.push(
                due,
                Box::new(move || {
                    let seen = order.fetch_add(1, AtomicOrdering::SeqCst);
                    assert_eq!(seen, expected);
                }),
            );
        }
        while let Some(task) = q.pop() {
            task.run();
        }
        assert_eq!(order.load(AtomicOrdering::SeqCst), 10);
    }

    #[test]
    fn next_due_peeks_without_removal() {
        let now = Instant::now();
        let mut q = DelayQueue::new();
        assert!(q.next_due().is_none());
        q.push(now + Duration::from_secs(1), noop());
        q.push(now, noop());
        assert_eq!(q.next_due(), Some(now));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn clear_discards_everything() {
        let mut q = DelayQueue::new();
        q.push(Instant::now(), noop());
        q.push(Instant::now(), noop());
        q.clear();
        assert!(q.is_empty());
        assert!(q.pop().is_none());
    }
}
