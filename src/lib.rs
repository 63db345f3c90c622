//! devpane - an in-page developer console overlay, compiled to WASM
//!
//! Intercepts the page's `console.log/info/warn/error`, prints the calls
//! line by line into an output panel, and accepts typed input: plain text
//! is echoed, script blocks (prefixed with `=>`) are evaluated and their
//! result printed.
//!
//! Layout:
//! - Core state machines (`text`, `history`, `printer`, `input`, `console`)
//!   are plain Rust and run natively against `platform::headless`
//! - The browser surface (`platform::web`, `bindings`) is wasm32 only
//! - All waiting goes through the `scheduler::Scheduler` seam

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod history;
pub mod input;
pub mod passthrough;
pub mod platform;
pub mod printer;
pub mod resources;
pub mod scheduler;
pub mod text;

#[cfg(target_arch = "wasm32")]
pub mod bindings;

pub use config::ConsoleConfig;
pub use console::{Console, Host, Session};
pub use error::{ConsoleError, ConsoleResult};

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM entry point. The overlay itself starts on `init()`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    init_panic_hook();
}

/// Log to browser console (WASM).
///
/// Goes to `console.debug`, which the overlay never intercepts.
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        ::web_sys::console::debug_1(&format!($($t)*).into())
    };
}

/// Log to stderr (native)
#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}
