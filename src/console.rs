//! Console facade
//!
//! Ties the pieces together: intercepted logging calls and user submissions
//! are formatted, tagged with a category and handed to the printer. Script
//! submissions are echoed and then evaluated; a thrown error prints as an
//! `error` line, a truthy result as a `script-eval` line.
//!
//! There is one console per page. `Session` is the slot that holds it and
//! turns every call made before `init` into `ConsoleError::NotInitialized`.

use crate::config::ConsoleConfig;
use crate::console_log;
use crate::error::{ConsoleError, ConsoleResult};
use crate::format::{self, Arg};
use crate::history::History;
use crate::input::InputController;
use crate::passthrough::{HostConsole, Level, Passthrough};
use crate::platform::{Evaluator, Viewport};
use crate::printer::{Attributes, Category, LineAttributes, Printer};
use crate::resources::{LoadCallback, ReloadOutcome, ResourceKind, ResourceLoader, ResourceTable};
use crate::scheduler::Scheduler;
use crate::text::ScriptMarker;
use std::cell::RefCell;
use std::rc::Rc;

/// Signatures listed by `help()`
const COMMANDS: &[&str] = &[
    "init(stdEnabled)",
    "initWithOptions(options)",
    "release()",
    "help()",
    "clear()",
    "log(...args, Map? opts)",
    "info(...args, Map? opts)",
    "warn(...args, Map? opts)",
    "error(...args, Map? opts)",
    "enableStdPassthrough()",
    "disableStdPassthrough()",
    "printUsingTimeouts()",
    "printUsingAnimations()",
    "loadScript(url)",
    "listScripts()",
    "reloadScript(index)",
    "loadModule(url)",
    "listModules()",
    "reloadModule(index)",
    "loadStylesheet(url)",
    "listStylesheets()",
    "reloadStylesheet(index)",
];

/// The page collaborators a console is built on
pub struct Host {
    pub viewport: Rc<dyn Viewport>,
    pub scheduler: Rc<dyn Scheduler>,
    pub evaluator: Box<dyn Evaluator>,
    pub loader: Box<dyn ResourceLoader>,
    pub host_console: Box<dyn HostConsole>,
}

/// The in-page console
pub struct Console {
    marker: ScriptMarker,
    printer: Printer,
    input: InputController,
    passthrough: Passthrough,
    evaluator: Box<dyn Evaluator>,
    loader: Box<dyn ResourceLoader>,
    resources: RefCell<ResourceTable>,
}

impl Console {
    /// Build the console and install the logging intercept.
    pub fn new(config: &ConsoleConfig, host: Host) -> ConsoleResult<Self> {
        config.validate()?;
        console_log!("[devpane] Initializing console...");

        let marker = ScriptMarker::new(config.marker.clone());
        let mut history = History::new(config.history_capacity);
        history.reset(config.history_capacity, config.history_empty_value.clone());

        let printer = Printer::new(
            Rc::clone(&host.viewport),
            Rc::clone(&host.scheduler),
            config.cadence(),
        );
        let input = InputController::new(host.viewport, host.scheduler, marker.clone(), history);
        let passthrough = Passthrough::new(host.host_console, config.std_passthrough);
        passthrough.install()?;

        console_log!("[devpane] Console initiated");
        Ok(Self {
            marker,
            printer,
            input,
            passthrough,
            evaluator: host.evaluator,
            loader: host.loader,
            resources: RefCell::new(ResourceTable::new()),
        })
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    /// Restore the page's logging functions
    pub fn release(&self) {
        self.passthrough.uninstall();
        console_log!("[passthrough] Host console restored");
    }

    pub fn help() -> String {
        format!("Available functions:\n{}", COMMANDS.join("\n"))
    }

    pub fn clear(&self) {
        self.printer.clear();
        self.passthrough.clear();
    }

    pub fn log(&self, args: &[Arg], attributes: Attributes) {
        self.emit(Level::Log, args, attributes);
    }

    pub fn info(&self, args: &[Arg], attributes: Attributes) {
        self.emit(Level::Info, args, attributes);
    }

    pub fn warn(&self, args: &[Arg], attributes: Attributes) {
        self.emit(Level::Warn, args, attributes);
    }

    pub fn error(&self, args: &[Arg], attributes: Attributes) {
        self.emit(Level::Error, args, attributes);
    }

    /// Format, print and (if enabled) forward one intercepted call
    pub fn emit(&self, level: Level, args: &[Arg], attributes: Attributes) {
        let message = format::format_args(args);
        self.printer
            .enqueue(&message, LineAttributes::with_extra(level.category(), attributes));
        self.passthrough.forward(level, args);
    }

    pub fn enable_std_passthrough(&self) {
        self.passthrough.enable();
    }

    pub fn disable_std_passthrough(&self) {
        self.passthrough.disable();
    }

    pub fn print_using_timeouts(&self) {
        self.printer.use_timeouts();
    }

    pub fn print_using_animations(&self) {
        self.printer.use_animations();
    }

    // ===== Input glue =====

    /// Key released on the page
    pub fn on_page_key(&self, key: &str) {
        self.input.on_page_key(key);
    }

    /// Key released in the input; dispatches a submission if it made one
    pub fn on_input_key(&self, key: &str) {
        if let Some(content) = self.input.handle_key(key) {
            self.submit(&content);
        }
    }

    pub fn on_input_blur(&self) {
        self.input.on_blur();
    }

    /// Print a submission; scripts are echoed, then evaluated.
    pub fn submit(&self, content: &str) {
        if !self.marker.is_script(content) {
            self.print_line(content, Category::Text);
            return;
        }
        let body = self.marker.script_body(content);
        if body.is_empty() {
            return;
        }
        self.print_line(&body, Category::Script);
        self.evaluate(&body);
    }

    fn evaluate(&self, body: &str) {
        match self.evaluator.evaluate(body) {
            Ok(value) if value.is_truthy() => {
                self.print_line(&format::format_arg(&value), Category::ScriptEval);
            }
            Ok(_) => {}
            Err(message) => self.error(&[Arg::Str(message)], Attributes::new()),
        }
    }

    fn print_line(&self, message: &str, category: Category) {
        self.printer.enqueue(message, LineAttributes::new(category));
        self.passthrough.forward(Level::Log, &[Arg::from(message)]);
    }

    // ===== Resources =====

    pub fn load_script(&self, url: &str, on_load: Option<LoadCallback>) -> ConsoleResult<()> {
        self.load(ResourceKind::Script, url, on_load)
    }

    pub fn list_scripts(&self) -> String {
        self.resources.borrow().list(ResourceKind::Script)
    }

    pub fn reload_script(&self, index: i64) -> ConsoleResult<ReloadOutcome> {
        self.reload(ResourceKind::Script, index)
    }

    pub fn load_module(&self, url: &str, on_load: Option<LoadCallback>) -> ConsoleResult<()> {
        self.load(ResourceKind::Module, url, on_load)
    }

    pub fn list_modules(&self) -> String {
        self.resources.borrow().list(ResourceKind::Module)
    }

    pub fn reload_module(&self, index: i64) -> ConsoleResult<ReloadOutcome> {
        self.reload(ResourceKind::Module, index)
    }

    pub fn load_stylesheet(&self, url: &str) -> ConsoleResult<()> {
        self.load(ResourceKind::Stylesheet, url, None)
    }

    pub fn list_stylesheets(&self) -> String {
        self.resources.borrow().list(ResourceKind::Stylesheet)
    }

    pub fn reload_stylesheet(&self, index: i64) -> ConsoleResult<ReloadOutcome> {
        self.reload(ResourceKind::Stylesheet, index)
    }

    fn load(
        &self,
        kind: ResourceKind,
        url: &str,
        on_load: Option<LoadCallback>,
    ) -> ConsoleResult<()> {
        self.resources
            .borrow_mut()
            .load(self.loader.as_ref(), url, kind, on_load)
    }

    fn reload(&self, kind: ResourceKind, index: i64) -> ConsoleResult<ReloadOutcome> {
        self.resources
            .borrow_mut()
            .reload(self.loader.as_ref(), kind, index)
    }
}

/// Holder for the page's one console
#[derive(Default)]
pub struct Session {
    console: RefCell<Option<Rc<Console>>>,
}

impl Session {
    pub const fn new() -> Self {
        Self { console: RefCell::new(None) }
    }

    pub fn is_initialized(&self) -> bool {
        self.console.borrow().is_some()
    }

    /// Install `console` unless one is already running; returns whether it was installed.
    pub fn install(&self, console: Console) -> bool {
        let mut slot = self.console.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(Rc::new(console));
        true
    }

    /// The running console.
    ///
    /// The slot is not borrowed while the caller uses it, so re-entrant calls
    /// (a script that logs while being evaluated) are fine.
    pub fn get(&self) -> ConsoleResult<Rc<Console>> {
        self.console
            .borrow()
            .as_ref()
            .map(Rc::clone)
            .ok_or(ConsoleError::NotInitialized)
    }

    /// Release the running console and empty the slot
    pub fn shutdown(&self) -> ConsoleResult<()> {
        let console = self.console.borrow_mut().take().ok_or(ConsoleError::NotInitialized)?;
        console.release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessViewport, HostCall, RecordingConsole, RecordingLoader};
    use crate::scheduler::ManualScheduler;
    use serde_json::json;

    struct Fixture {
        console: Console,
        viewport: Rc<HeadlessViewport>,
        scheduler: Rc<ManualScheduler>,
        host: RecordingConsole,
    }

    fn evaluate(source: &str) -> Result<Arg, String> {
        match source {
            "1+1" => Ok(Arg::Number(2.0)),
            "undefined" => Ok(Arg::Undefined),
            "({a: 1})" => Ok(Arg::Object(json!({"a": 1}))),
            other => Err(format!("{} is not defined", other)),
        }
    }

    fn fixture(config: ConsoleConfig) -> Fixture {
        let viewport = Rc::new(HeadlessViewport::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let host = RecordingConsole::new();
        let console = Console::new(
            &config,
            Host {
                viewport: viewport.clone(),
                scheduler: scheduler.clone(),
                evaluator: Box::new(evaluate),
                loader: Box::new(RecordingLoader::new()),
                host_console: Box::new(host.clone()),
            },
        )
        .unwrap();
        Fixture { console, viewport, scheduler, host }
    }

    fn printed(f: &Fixture) -> Vec<(String, Category)> {
        f.scheduler.run_until_idle();
        f.viewport
            .rendered_lines()
            .into_iter()
            .map(|l| (l.content, l.attributes.category))
            .collect()
    }

    #[test]
    fn test_log_levels_are_tagged() {
        let f = fixture(ConsoleConfig::default());
        let args = [Arg::from("%s has %d items"), Arg::from("cart"), Arg::from(3)];
        f.console.log(&args, Attributes::new());
        f.console.warn(&[Arg::from("careful")], Attributes::new());
        f.console.error(&[Arg::from("a\nb")], Attributes::new());

        assert_eq!(
            printed(&f),
            vec![
                ("cart has 3 items".to_string(), Category::Log),
                ("careful".to_string(), Category::Warn),
                ("a".to_string(), Category::Error),
                ("b".to_string(), Category::Error),
            ]
        );
    }

    #[test]
    fn test_attributes_reach_rendered_line() {
        let f = fixture(ConsoleConfig::default());
        let mut attrs = Attributes::new();
        attrs.insert("style".into(), "color: teal".into());
        f.console.info(&[Arg::from("styled")], attrs);
        f.scheduler.run_until_idle();

        let line = &f.viewport.rendered_lines()[0];
        assert_eq!(line.attributes.category, Category::Info);
        assert_eq!(line.attributes.style(), Some("color: teal"));
    }

    #[test]
    fn test_passthrough_forwards_raw_args() {
        let f = fixture(ConsoleConfig { std_passthrough: true, ..ConsoleConfig::default() });
        assert!(f.host.is_installed());
        let args = [Arg::from("%d"), Arg::from(7)];
        f.console.info(&args, Attributes::new());
        f.console.clear();

        assert_eq!(
            f.host.calls(),
            vec![HostCall::Forward(Level::Info, args.to_vec()), HostCall::Clear]
        );

        f.console.disable_std_passthrough();
        f.console.log(&[Arg::from("quiet")], Attributes::new());
        assert_eq!(f.host.calls().len(), 2);
    }

    #[test]
    fn test_passthrough_disabled_by_default() {
        let f = fixture(ConsoleConfig::default());
        f.console.log(&[Arg::from("x")], Attributes::new());
        assert!(f.host.calls().is_empty());

        f.console.enable_std_passthrough();
        f.console.log(&[Arg::from("y")], Attributes::new());
        assert_eq!(f.host.calls().len(), 1);
    }

    #[test]
    fn test_submit_text() {
        let f = fixture(ConsoleConfig::default());
        f.console.submit("hello");
        assert_eq!(printed(&f), vec![("hello".to_string(), Category::Text)]);
    }

    #[test]
    fn test_submit_script_echoes_and_evaluates() {
        let f = fixture(ConsoleConfig::default());
        f.console.submit("=>\n1+1");
        f.console.submit("=>\n({a: 1})");
        assert_eq!(
            printed(&f),
            vec![
                ("1+1".to_string(), Category::Script),
                ("2".to_string(), Category::ScriptEval),
                ("({a: 1})".to_string(), Category::Script),
                ("{ a: 1 }".to_string(), Category::ScriptEval),
            ]
        );
    }

    #[test]
    fn test_falsy_result_prints_nothing_and_errors_print_as_error() {
        let f = fixture(ConsoleConfig::default());
        f.console.submit("=>undefined");
        f.console.submit("=>nope");
        assert_eq!(
            printed(&f),
            vec![
                ("undefined".to_string(), Category::Script),
                ("nope".to_string(), Category::Script),
                ("nope is not defined".to_string(), Category::Error),
            ]
        );
    }

    #[test]
    fn test_empty_script_body_is_ignored() {
        let f = fixture(ConsoleConfig::default());
        f.console.submit("=>  ");
        assert!(printed(&f).is_empty());
    }

    #[test]
    fn test_custom_marker() {
        let f = fixture(ConsoleConfig { marker: "js>".into(), ..ConsoleConfig::default() });
        f.console.submit("js>1+1");
        f.console.submit("=>1+1");
        let lines = printed(&f);
        assert_eq!(lines[0], ("1+1".to_string(), Category::Script));
        assert_eq!(lines[2], ("=>1+1".to_string(), Category::Text));
    }

    #[test]
    fn test_cadence_switches() {
        let f = fixture(ConsoleConfig::default());
        f.console.print_using_timeouts();
        assert_eq!(f.console.printer().cadence(), crate::printer::Cadence::Timeouts);
        f.console.print_using_animations();
        assert_eq!(f.console.printer().cadence(), crate::printer::Cadence::Animations);
    }

    #[test]
    fn test_resources_through_facade() {
        let f = fixture(ConsoleConfig::default());
        f.console.load_script("app.js", None).unwrap();
        f.console.load_module("mod.js", None).unwrap();
        f.console.load_stylesheet("theme.css").unwrap();

        assert_eq!(f.console.list_scripts(), "Loaded scripts (1):\n1. app.js");
        assert_eq!(f.console.list_modules(), "Loaded modules (1):\n1. mod.js");
        assert_eq!(f.console.list_stylesheets(), "Loaded stylesheets (1):\n1. theme.css");
        assert_eq!(
            f.console.reload_module(3).unwrap().to_string(),
            "Module index is out of range!"
        );
        assert_eq!(
            f.console.reload_stylesheet(1).unwrap().to_string(),
            "Reloaded theme.css?c=1"
        );
        assert!(matches!(f.console.reload_script(1).unwrap(), ReloadOutcome::Reloaded { .. }));
    }

    #[test]
    fn test_help_lists_commands() {
        let help = Console::help();
        assert!(help.starts_with("Available functions:\n"));
        assert!(help.contains("reloadStylesheet(index)"));
        assert_eq!(help.lines().count(), COMMANDS.len() + 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let viewport = Rc::new(HeadlessViewport::new());
        let result = Console::new(
            &ConsoleConfig { marker: String::new(), ..ConsoleConfig::default() },
            Host {
                viewport,
                scheduler: Rc::new(ManualScheduler::new()),
                evaluator: Box::new(evaluate),
                loader: Box::new(RecordingLoader::new()),
                host_console: Box::new(RecordingConsole::new()),
            },
        );
        assert!(matches!(result, Err(ConsoleError::InvalidConfig(_))));
    }

    #[test]
    fn test_session_before_and_after_init() {
        let session = Session::new();
        assert!(matches!(session.get(), Err(ConsoleError::NotInitialized)));
        assert_eq!(session.shutdown(), Err(ConsoleError::NotInitialized));

        let f = fixture(ConsoleConfig::default());
        let host = f.host.clone();
        assert!(session.install(f.console));
        assert!(session.is_initialized());
        assert!(session.get().is_ok());

        let second = fixture(ConsoleConfig::default());
        assert!(!session.install(second.console));

        session.shutdown().unwrap();
        assert!(!host.is_installed());
        assert!(!session.is_initialized());
    }
}
