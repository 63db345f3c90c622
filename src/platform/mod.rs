//! Platform Abstraction Layer
//!
//! The console core never touches the DOM directly. It talks to the page
//! through a few narrow traits:
//!
//! - `Viewport`: the output panel and the one text-input widget
//! - `Evaluator`: runs a script snippet against live page state
//! - `ResourceLoader` (in `resources`) and `HostConsole` (in `passthrough`)
//!
//! Implementations:
//! - Browser (via wasm-bindgen, web-sys): `web`
//! - In-memory stand-ins for native runs and tests: `headless`

#[cfg(target_arch = "wasm32")]
pub mod web;

pub mod headless;

use crate::format::Arg;
use crate::printer::QueuedLine;

/// Classification shown by the input widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    Script,
}

impl InputMode {
    /// CSS class the widget carries in this mode
    pub fn class_name(self) -> &'static str {
        match self {
            InputMode::Text => "user-input-text",
            InputMode::Script => "user-input-script",
        }
    }
}

/// Rendering surface: a scrollable output panel plus one input widget.
///
/// Methods take `&self`; implementations use interior mutability since the
/// printer and the input controller share one view-port.
pub trait Viewport {
    // ===== Output panel =====

    /// Append a line break to the output
    fn append_line_break(&self);

    /// Append one styled text item to the output
    fn append_text(&self, line: &QueuedLine);

    /// Remove everything from the output
    fn clear_output(&self);

    /// Force the scroll position to the bottom
    fn scroll_to_bottom(&self);

    // ===== Input widget =====

    /// Current raw content of the input
    fn input_value(&self) -> String;

    fn set_input_value(&self, value: &str);

    fn set_input_visible(&self, visible: bool);

    fn set_input_mode(&self, mode: InputMode);

    /// Give the input keyboard focus
    fn focus_input(&self);

    /// Move focus away from the input, back to the page
    fn release_focus(&self);

    /// Computed style value of the input, e.g. `font-size` -> `"14px"`
    fn input_style_value(&self, property: &str) -> Option<String>;

    fn set_input_height(&self, height: &str);
}

/// Runs a script snippet in the page's global scope.
///
/// `Err` carries the thrown error's message.
pub trait Evaluator {
    fn evaluate(&self, source: &str) -> Result<Arg, String>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> Result<Arg, String>,
{
    fn evaluate(&self, source: &str) -> Result<Arg, String> {
        self(source)
    }
}
