//! Input controller
//!
//! Owns the lifecycle of the one text-input widget:
//! - page-level Enter shows it, blur (with empty content) hides it
//! - an idle auto-hide fires 9369ms after it was shown or emptied
//! - Up/Down browse the history
//! - Enter decides between "keep editing" and "submit"
//!
//! Keys arrive after the widget has applied them (keyup), so the content
//! already reflects the key when `handle_key` runs.
//!
//! States: `Hidden`, `VisibleText`, `VisibleScript`. Both visibility states
//! are steady; nothing here is terminal.

use crate::history::History;
use crate::platform::{InputMode, Viewport};
use crate::scheduler::{Defer, Scheduler};
use crate::text::{self, ScriptMarker};
use std::cell::RefCell;
use std::rc::Rc;

/// Idle time before an empty, visible input hides itself
pub const AUTO_HIDE_MS: u32 = 9369;

/// Delay for ordered scroll-to-bottom after layout changes
pub const SCROLL_DELAY_MS: u32 = 240;

/// Rendered height per line, in multiples of the font size
pub const LINE_HEIGHT_FACTOR: f64 = 1.44;

/// Observable state of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Hidden,
    VisibleText,
    VisibleScript,
}

struct Inner {
    visible: bool,
    mode: InputMode,
    marker: ScriptMarker,
    history: History,
}

/// The input widget's state machine. Clones share state.
#[derive(Clone)]
pub struct InputController {
    inner: Rc<RefCell<Inner>>,
    viewport: Rc<dyn Viewport>,
    scheduler: Rc<dyn Scheduler>,
}

impl InputController {
    pub fn new(
        viewport: Rc<dyn Viewport>,
        scheduler: Rc<dyn Scheduler>,
        marker: ScriptMarker,
        history: History,
    ) -> Self {
        viewport.set_input_visible(false);
        viewport.set_input_mode(InputMode::Text);
        Self {
            inner: Rc::new(RefCell::new(Inner {
                visible: false,
                mode: InputMode::Text,
                marker,
                history,
            })),
            viewport,
            scheduler,
        }
    }

    pub fn state(&self) -> InputState {
        let inner = self.inner.borrow();
        match (inner.visible, inner.mode) {
            (false, _) => InputState::Hidden,
            (true, InputMode::Text) => InputState::VisibleText,
            (true, InputMode::Script) => InputState::VisibleScript,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.inner.borrow().visible
    }

    /// Run `f` against the submission history
    pub fn with_history<R>(&self, f: impl FnOnce(&mut History) -> R) -> R {
        f(&mut self.inner.borrow_mut().history)
    }

    /// Key released anywhere on the page
    pub fn on_page_key(&self, key: &str) {
        if key == "Enter" && !self.is_visible() {
            self.show();
        }
    }

    /// Input lost focus
    pub fn on_blur(&self) {
        self.hide();
    }

    /// Reveal and focus the widget. No-op if already visible.
    pub fn show(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.visible {
                return;
            }
            inner.visible = true;
        }
        self.viewport.set_input_visible(true);
        self.adjust_mode();
        self.order_hide();
        self.viewport.focus_input();
        self.order_scroll_to_bottom();
    }

    /// Hide the widget unless it is already hidden or holds content.
    ///
    /// Stale auto-hide timers land here too; the content check makes them
    /// harmless.
    pub fn hide(&self) {
        if !self.viewport.input_value().is_empty() {
            return;
        }
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.visible {
                return;
            }
            inner.visible = false;
        }
        self.viewport.set_input_visible(false);
        self.order_scroll_to_bottom();
        self.viewport.release_focus();
    }

    /// Handle a key released inside the widget.
    ///
    /// Returns the normalized content when the key submitted it.
    pub fn handle_key(&self, key: &str) -> Option<String> {
        let raw = self.viewport.input_value();
        let mut submitted = None;

        match key {
            "ArrowUp" => {
                let value = self.recall(History::prev_entry);
                self.viewport.set_input_value(&value);
            }
            "ArrowDown" => {
                let value = self.recall(History::next_entry);
                self.viewport.set_input_value(&value);
            }
            ">" if raw == self.marker() => {
                self.viewport.set_input_value(&format!("{}\n", raw));
            }
            "Backspace" if raw == self.marker() => {
                self.viewport.set_input_value("");
            }
            "Enter" => submitted = self.enter(&raw),
            _ => {}
        }

        self.adjust_mode();
        self.adjust_height();
        if self.viewport.input_value().is_empty() {
            self.order_hide();
        }
        submitted
    }

    fn enter(&self, raw: &str) -> Option<String> {
        let content = text::clean(raw);
        let mut inner = self.inner.borrow_mut();
        let is_script = inner.marker.is_script(raw);
        let can_submit = if is_script {
            inner.marker.is_submittable_script(raw)
        } else {
            inner.marker.is_submittable(&content)
        };

        if !can_submit {
            let kept = if is_script {
                text::trim_trailing_blank_script_lines(raw)
            } else {
                content
            };
            drop(inner);
            self.viewport.set_input_value(&kept);
            return None;
        }

        if is_script {
            let body = inner.marker.script_body(&content);
            inner.history.record_script(&body);
        } else {
            inner.history.record(&content);
        }
        drop(inner);
        self.viewport.set_input_value("");
        Some(content)
    }

    /// Step the history; script entries come back with their marker line
    fn recall(&self, step: fn(&mut History) -> String) -> String {
        let mut inner = self.inner.borrow_mut();
        let value = step(&mut inner.history);
        if inner.history.current_is_script() {
            format!("{}\n{}", inner.marker.as_str(), value)
        } else {
            value
        }
    }

    fn marker(&self) -> String {
        self.inner.borrow().marker.as_str().to_string()
    }

    /// Mirror the content's classification onto the widget
    fn adjust_mode(&self) {
        let value = self.viewport.input_value();
        let mode = {
            let mut inner = self.inner.borrow_mut();
            let mode = if inner.marker.is_script(&value) {
                InputMode::Script
            } else {
                InputMode::Text
            };
            if mode == inner.mode {
                return;
            }
            inner.mode = mode;
            mode
        };
        self.viewport.set_input_mode(mode);
        self.order_scroll_to_bottom();
    }

    /// Grow the widget to roughly 1.44 line-heights per content line
    fn adjust_height(&self) {
        let height = self
            .viewport
            .input_style_value("height")
            .and_then(|h| text::parse_num_txt_pair(&h));
        let font_size = self
            .viewport
            .input_style_value("font-size")
            .and_then(|f| text::parse_num_txt_pair(&f));
        let (Some(_), Some(font_size)) = (height, font_size) else {
            return;
        };
        let lines = text::count_lines(&self.viewport.input_value()) as f64;
        let new_height = (lines * font_size.num * LINE_HEIGHT_FACTOR).ceil();
        self.viewport
            .set_input_height(&format!("{}{}", new_height, font_size.txt));
    }

    fn order_hide(&self) {
        let controller = self.clone();
        self.scheduler
            .defer(Defer::Millis(AUTO_HIDE_MS), Box::new(move || controller.hide()));
    }

    fn order_scroll_to_bottom(&self) {
        let viewport = Rc::clone(&self.viewport);
        self.scheduler.defer(
            Defer::Millis(SCROLL_DELAY_MS),
            Box::new(move || viewport.scroll_to_bottom()),
        );
    }
}
