//! Cooperative scheduling seam
//!
//! Everything runs on the page's single UI thread. Work that must not block
//! (the print loop, the input auto-hide) yields by handing a task to a
//! `Scheduler`, which runs it on a later callback turn:
//! - `Defer::Frame` on the next animation frame
//! - `Defer::Millis(n)` after a fixed delay
//!
//! The browser implementation lives in `platform::web`; `manual` provides a
//! virtual clock for driving the same code natively.

pub mod manual;

pub use manual::ManualScheduler;

/// A deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// When a deferred task should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defer {
    /// Next animation frame
    Frame,
    /// After a delay in milliseconds
    Millis(u32),
}

/// Runs tasks on a later turn of the event loop
pub trait Scheduler {
    /// Queue `task`; it never runs before `defer` returns.
    fn defer(&self, when: Defer, task: Task);
}
