//! Virtual-clock scheduler
//!
//! Deferred tasks sit in a min-heap keyed by deadline; `advance` moves the
//! clock forward and runs whatever came due, in deadline order (FIFO among
//! equal deadlines). Tasks may defer further tasks while running.

use super::{Defer, Scheduler, Task};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Milliseconds one animation frame takes on the virtual clock
pub const FRAME_MS: f64 = 16.0;

/// Entry in the deadline heap
#[derive(Debug)]
struct Entry {
    deadline: f64,
    id: u64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
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
        // Reversed for a min-heap: earliest deadline, then lowest id
        other
            .deadline
            .partial_cmp(&self.deadline)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Default)]
struct Inner {
    now: f64,
    heap: BinaryHeap<Entry>,
    tasks: HashMap<u64, Task>,
    next_id: u64,
}

/// Scheduler driven by an explicit virtual clock
#[derive(Default)]
pub struct ManualScheduler {
    inner: RefCell<Inner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Number of tasks waiting to run
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Time until the next task is due
    pub fn time_until_next(&self) -> Option<f64> {
        let inner = self.inner.borrow();
        inner.heap.peek().map(|e| (e.deadline - inner.now).max(0.0))
    }

    /// Move the clock forward by `ms`, running every task that comes due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, ms: f64) -> usize {
        let target = self.now() + ms;
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.inner.borrow_mut().now = target;
        ran
    }

    /// Run tasks until none are left, jumping the clock as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due(f64::INFINITY) {
            task();
            ran += 1;
        }
        ran
    }

    /// Pop the earliest task due at or before `target`, advancing the clock to it.
    /// The borrow is released before the task runs.
    fn pop_due(&self, target: f64) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();
        let due = inner.heap.peek().is_some_and(|e| e.deadline <= target);
        if !due {
            return None;
        }
        let entry = inner.heap.pop()?;
        if entry.deadline > inner.now {
            inner.now = entry.deadline;
        }
        inner.tasks.remove(&entry.id)
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, when: Defer, task: Task) {
        let mut inner = self.inner.borrow_mut();
        let delay = match when {
            Defer::Frame => FRAME_MS,
            Defer::Millis(ms) => f64::from(ms),
        };
        let id = inner.next_id;
        inner.next_id += 1;
        let deadline = inner.now + delay;
        inner.heap.push(Entry { deadline, id });
        inner.tasks.insert(id, task);
    }
}
