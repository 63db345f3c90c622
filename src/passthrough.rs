//! Host logging adapter
//!
//! The page's own `console.log/info/warn/error/clear` are swapped for the
//! overlay's wrappers on `install` and restored on `uninstall`. While
//! passthrough is enabled, every intercepted call is also forwarded to the
//! original function.

use crate::error::ConsoleResult;
use crate::format::Arg;
use crate::printer::Category;
use std::cell::Cell;

/// Severity of an intercepted logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Log,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Name of the host console method
    pub fn method_name(self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Level::Log => Category::Log,
            Level::Info => Category::Info,
            Level::Warn => Category::Warn,
            Level::Error => Category::Error,
        }
    }
}

/// The page's real logging functions
pub trait HostConsole {
    /// Replace the host functions with the overlay's wrappers
    fn install(&self) -> ConsoleResult<()>;

    /// Put the original host functions back
    fn uninstall(&self);

    /// Call the original function for `level`
    fn forward(&self, level: Level, args: &[Arg]);

    /// Call the original `clear`
    fn clear(&self);
}

/// Switchable forwarding to the host console
pub struct Passthrough {
    host: Box<dyn HostConsole>,
    enabled: Cell<bool>,
    installed: Cell<bool>,
}

impl Passthrough {
    pub fn new(host: Box<dyn HostConsole>, enabled: bool) -> Self {
        Self {
            host,
            enabled: Cell::new(enabled),
            installed: Cell::new(false),
        }
    }

    /// Install the wrappers. A second call is a no-op.
    pub fn install(&self) -> ConsoleResult<()> {
        if self.installed.get() {
            return Ok(());
        }
        self.host.install()?;
        self.installed.set(true);
        Ok(())
    }

    /// Restore the host functions. Forwarding stops until the next install.
    pub fn uninstall(&self) {
        if !self.installed.replace(false) {
            return;
        }
        self.host.uninstall();
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }

    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn is_active(&self) -> bool {
        self.installed.get() && self.enabled.get()
    }

    pub fn forward(&self, level: Level, args: &[Arg]) {
        if self.is_active() {
            self.host.forward(level, args);
        }
    }

    pub fn clear(&self) {
        if self.is_active() {
            self.host.clear();
        }
    }
}
