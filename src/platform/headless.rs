//! Headless platform
//!
//! In-memory stand-ins for the browser collaborators. They record what the
//! console asked for, so the state machines can run natively without a page.

use super::{InputMode, Viewport};
use crate::error::{ConsoleError, ConsoleResult};
use crate::format::Arg;
use crate::passthrough::{HostConsole, Level};
use crate::printer::QueuedLine;
use crate::resources::{LoadCallback, ResourceHandle, ResourceKind, ResourceLoader};
use slab::Slab;
use std::cell::RefCell;
use std::rc::Rc;

/// Node appended to the output panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNode {
    LineBreak,
    Text(QueuedLine),
}

struct ViewState {
    nodes: Vec<OutputNode>,
    scrolls: usize,
    input: String,
    visible: bool,
    mode: InputMode,
    focused: bool,
    font_size: String,
    height: String,
}

/// View-port backed by plain vectors and strings
pub struct HeadlessViewport {
    state: RefCell<ViewState>,
}

impl HeadlessViewport {
    pub fn new() -> Self {
        Self::with_font_size("14px")
    }

    /// Input widget computing to the given `font-size`
    pub fn with_font_size(font_size: &str) -> Self {
        Self {
            state: RefCell::new(ViewState {
                nodes: Vec::new(),
                scrolls: 0,
                input: String::new(),
                visible: false,
                mode: InputMode::Text,
                focused: false,
                font_size: font_size.to_string(),
                height: "20px".to_string(),
            }),
        }
    }

    pub fn nodes(&self) -> Vec<OutputNode> {
        self.state.borrow().nodes.clone()
    }

    /// Text items rendered so far, in order
    pub fn rendered_lines(&self) -> Vec<QueuedLine> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter_map(|n| match n {
                OutputNode::Text(line) => Some(line.clone()),
                OutputNode::LineBreak => None,
            })
            .collect()
    }

    /// Times the output was forced to the bottom
    pub fn scroll_count(&self) -> usize {
        self.state.borrow().scrolls
    }

    pub fn is_input_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn input_mode(&self) -> InputMode {
        self.state.borrow().mode
    }

    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    pub fn input_height(&self) -> String {
        self.state.borrow().height.clone()
    }
}

impl Default for HeadlessViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport for HeadlessViewport {
    fn append_line_break(&self) {
        self.state.borrow_mut().nodes.push(OutputNode::LineBreak);
    }

    fn append_text(&self, line: &QueuedLine) {
        self.state.borrow_mut().nodes.push(OutputNode::Text(line.clone()));
    }

    fn clear_output(&self) {
        self.state.borrow_mut().nodes.clear();
    }

    fn scroll_to_bottom(&self) {
        self.state.borrow_mut().scrolls += 1;
    }

    fn input_value(&self) -> String {
        self.state.borrow().input.clone()
    }

    fn set_input_value(&self, value: &str) {
        self.state.borrow_mut().input = value.to_string();
    }

    fn set_input_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn set_input_mode(&self, mode: InputMode) {
        self.state.borrow_mut().mode = mode;
    }

    fn focus_input(&self) {
        self.state.borrow_mut().focused = true;
    }

    fn release_focus(&self) {
        self.state.borrow_mut().focused = false;
    }

    fn input_style_value(&self, property: &str) -> Option<String> {
        let state = self.state.borrow();
        match property {
            "font-size" => Some(state.font_size.clone()),
            "height" => Some(state.height.clone()),
            _ => None,
        }
    }

    fn set_input_height(&self, height: &str) {
        self.state.borrow_mut().height = height.to_string();
    }
}

/// A call that reached the host console
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Forward(Level, Vec<Arg>),
    Clear,
}

#[derive(Default)]
struct HostLog {
    installed: bool,
    calls: Vec<HostCall>,
}

/// Host console that records forwarded calls. Clones share one record.
#[derive(Clone, Default)]
pub struct RecordingConsole {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.log.borrow().installed
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.log.borrow().calls.clone()
    }
}

impl HostConsole for RecordingConsole {
    fn install(&self) -> ConsoleResult<()> {
        self.log.borrow_mut().installed = true;
        Ok(())
    }

    fn uninstall(&self) {
        self.log.borrow_mut().installed = false;
    }

    fn forward(&self, level: Level, args: &[Arg]) {
        self.log
            .borrow_mut()
            .calls
            .push(HostCall::Forward(level, args.to_vec()));
    }

    fn clear(&self) {
        self.log.borrow_mut().calls.push(HostCall::Clear);
    }
}

#[derive(Default)]
struct LoaderState {
    live: Slab<(String, ResourceKind)>,
    injected: Vec<String>,
    pending: Vec<LoadCallback>,
}

/// Resource loader that keeps "elements" in a slab. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingLoader {
    state: Rc<RefCell<LoaderState>>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs currently injected into the page
    pub fn live_urls(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut live: Vec<_> = state.live.iter().collect();
        live.sort_by_key(|(key, _)| *key);
        live.into_iter().map(|(_, (url, _))| url.clone()).collect()
    }

    /// Every URL ever injected, in order
    pub fn injected(&self) -> Vec<String> {
        self.state.borrow().injected.clone()
    }

    /// Fire `load` for everything injected so far
    pub fn fire_loads(&self) -> usize {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        let fired = pending.len();
        for callback in pending {
            callback();
        }
        fired
    }
}

impl ResourceLoader for RecordingLoader {
    fn inject(
        &self,
        url: &str,
        kind: ResourceKind,
        on_load: Option<LoadCallback>,
    ) -> ConsoleResult<ResourceHandle> {
        if url.is_empty() {
            return Err(ConsoleError::MissingArgument("url"));
        }
        let mut state = self.state.borrow_mut();
        let key = state.live.insert((url.to_string(), kind));
        state.injected.push(url.to_string());
        if let Some(callback) = on_load {
            state.pending.push(callback);
        }
        Ok(ResourceHandle(key))
    }

    fn remove(&self, handle: ResourceHandle) {
        let mut state = self.state.borrow_mut();
        if state.live.contains(handle.0) {
            state.live.remove(handle.0);
        }
    }
}
