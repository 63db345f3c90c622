//! Print queue
//!
//! Serializes formatted output into the view-port one line at a time:
//! - `enqueue` splits a message into lines and appends them as one batch
//! - a single drain loop renders the oldest batch line by line, yielding to
//!   the scheduler between lines (animation frame or 144ms timer)
//! - after each batch the loop pauses 369ms before looking for more, so
//!   bursts of output stream instead of landing all at once
//!
//! `enqueue` never blocks and never starts a second drain loop.

use crate::platform::Viewport;
use crate::scheduler::{Defer, Scheduler};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Delay between lines in timeout cadence
pub const LINE_DELAY_MS: u32 = 144;

/// Pause between batches
pub const BATCH_PAUSE_MS: u32 = 369;

/// Category tag of a printed line, rendered as its CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Log,
    Info,
    Warn,
    Error,
    Text,
    Script,
    ScriptEval,
}

impl Category {
    pub fn class_name(self) -> &'static str {
        match self {
            Category::Log => "log",
            Category::Info => "info",
            Category::Warn => "warn",
            Category::Error => "error",
            Category::Text => "text",
            Category::Script => "script",
            Category::ScriptEval => "script-eval",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Extra element attributes supplied by the caller (e.g. `style`)
pub type Attributes = BTreeMap<String, String>;

/// Styling attached to every line of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAttributes {
    pub category: Category,
    pub extra: Attributes,
}

impl LineAttributes {
    pub fn new(category: Category) -> Self {
        Self { category, extra: Attributes::new() }
    }

    /// Caller attributes; `class` is dropped since the category owns it
    pub fn with_extra(category: Category, mut extra: Attributes) -> Self {
        extra.remove("class");
        extra.remove("classList");
        Self { category, extra }
    }

    pub fn style(&self) -> Option<&str> {
        self.extra.get("style").map(String::as_str)
    }
}

/// One line waiting to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedLine {
    pub content: String,
    pub attributes: LineAttributes,
}

/// How the drain loop yields between lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cadence {
    /// Fixed 144ms timers
    #[default]
    Timeouts,
    /// Animation-frame callbacks
    Animations,
}

impl Cadence {
    fn defer(self) -> Defer {
        match self {
            Cadence::Timeouts => Defer::Millis(LINE_DELAY_MS),
            Cadence::Animations => Defer::Frame,
        }
    }
}

type Batch = VecDeque<QueuedLine>;

struct PrintState {
    queue: VecDeque<Batch>,
    printing: bool,
    cadence: Cadence,
}

/// Line-by-line output animator. Cheap to clone; clones share one queue.
#[derive(Clone)]
pub struct Printer {
    state: Rc<RefCell<PrintState>>,
    viewport: Rc<dyn Viewport>,
    scheduler: Rc<dyn Scheduler>,
}

impl Printer {
    pub fn new(viewport: Rc<dyn Viewport>, scheduler: Rc<dyn Scheduler>, cadence: Cadence) -> Self {
        Self {
            state: Rc::new(RefCell::new(PrintState {
                queue: VecDeque::new(),
                printing: false,
                cadence,
            })),
            viewport,
            scheduler,
        }
    }

    pub fn use_timeouts(&self) {
        self.state.borrow_mut().cadence = Cadence::Timeouts;
    }

    pub fn use_animations(&self) {
        self.state.borrow_mut().cadence = Cadence::Animations;
    }

    pub fn cadence(&self) -> Cadence {
        self.state.borrow().cadence
    }

    /// True while a batch is being drained
    pub fn is_printing(&self) -> bool {
        self.state.borrow().printing
    }

    /// Batches waiting behind the one being drained
    pub fn pending_batches(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Queue `message` as one batch, one item per line.
    pub fn enqueue(&self, message: &str, attributes: LineAttributes) {
        let batch: Batch = message
            .split('\n')
            .map(|line| QueuedLine {
                content: line.to_string(),
                attributes: attributes.clone(),
            })
            .collect();
        let idle = {
            let mut state = self.state.borrow_mut();
            state.queue.push_back(batch);
            !state.printing
        };
        if idle {
            self.print();
        }
    }

    /// Empty the render target. Pending batches are left alone.
    pub fn clear(&self) {
        self.viewport.clear_output();
    }

    fn print(&self) {
        let batch = {
            let mut state = self.state.borrow_mut();
            if state.printing {
                return;
            }
            let Some(batch) = state.queue.pop_front() else {
                return;
            };
            state.printing = true;
            batch
        };
        self.print_batch(batch);
    }

    fn print_batch(&self, mut batch: Batch) {
        let Some(line) = batch.pop_front() else {
            self.state.borrow_mut().printing = false;
            let printer = self.clone();
            self.scheduler
                .defer(Defer::Millis(BATCH_PAUSE_MS), Box::new(move || printer.print()));
            return;
        };

        self.viewport.append_line_break();
        self.viewport.append_text(&line);
        self.viewport.scroll_to_bottom();

        let printer = self.clone();
        let when = self.cadence().defer();
        self.scheduler
            .defer(when, Box::new(move || printer.print_batch(batch)));
    }
}
