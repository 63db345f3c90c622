//! Integration tests for the devpane console
//!
//! Drives a console end to end on the headless platform: keystrokes go in
//! through the input glue, time moves on the manual scheduler, and the
//! rendered output and history are checked at the end.

use devpane::console::{Console, Host, Session};
use devpane::error::ConsoleError;
use devpane::format::Arg;
use devpane::input::{AUTO_HIDE_MS, InputState};
use devpane::platform::headless::{HeadlessViewport, RecordingConsole, RecordingLoader};
use devpane::platform::{InputMode, Viewport};
use devpane::printer::{Attributes, BATCH_PAUSE_MS, Category, LINE_DELAY_MS};
use devpane::resources::ReloadOutcome;
use devpane::scheduler::ManualScheduler;
use devpane::ConsoleConfig;
use std::rc::Rc;

struct Page {
    console: Console,
    viewport: Rc<HeadlessViewport>,
    scheduler: Rc<ManualScheduler>,
    loader: RecordingLoader,
}

fn evaluate(source: &str) -> Result<Arg, String> {
    match source {
        "1+1" => Ok(Arg::Number(2.0)),
        "[1, 2].length" => Ok(Arg::Number(2.0)),
        "void 0" => Ok(Arg::Undefined),
        other => Err(format!("ReferenceError: {} is not defined", other)),
    }
}

fn open_page(config: ConsoleConfig) -> Page {
    let viewport = Rc::new(HeadlessViewport::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let loader = RecordingLoader::new();
    let console = Console::new(
        &config,
        Host {
            viewport: viewport.clone(),
            scheduler: scheduler.clone(),
            evaluator: Box::new(evaluate),
            loader: Box::new(loader.clone()),
            host_console: Box::new(RecordingConsole::new()),
        },
    )
    .unwrap();
    Page { console, viewport, scheduler, loader }
}

/// Type `content` into the widget and release `key`
fn type_and_release(page: &Page, content: &str, key: &str) {
    page.viewport.set_input_value(content);
    page.console.on_input_key(key);
}

fn printed(page: &Page) -> Vec<(String, Category)> {
    page.scheduler.run_until_idle();
    page.viewport
        .rendered_lines()
        .into_iter()
        .map(|l| (l.content, l.attributes.category))
        .collect()
}

fn history(page: &Page) -> Vec<String> {
    page.console
        .input()
        .with_history(|h| h.entries().map(str::to_string).collect())
}

// ============================================================================
// Typing and submitting
// ============================================================================

#[test]
fn test_text_then_script_session() {
    let page = open_page(ConsoleConfig::default());

    page.console.on_page_key("Enter");
    assert_eq!(page.console.input().state(), InputState::VisibleText);
    assert!(page.viewport.is_focused());

    type_and_release(&page, "hello\n", "Enter");
    assert_eq!(history(&page), vec!["hello"]);
    assert_eq!(page.viewport.input_value(), "");

    type_and_release(&page, "=>", "=");
    assert_eq!(page.viewport.input_mode(), InputMode::Script);
    type_and_release(&page, "=>\n1+1\n", "Enter");
    assert_eq!(page.viewport.input_value(), "=>\n1+1\n");
    type_and_release(&page, "=>\n1+1\n\n", "Enter");

    assert_eq!(history(&page), vec!["hello", "1+1"]);
    assert_eq!(
        printed(&page),
        vec![
            ("hello".to_string(), Category::Text),
            ("1+1".to_string(), Category::Script),
            ("2".to_string(), Category::ScriptEval),
        ]
    );
}

#[test]
fn test_script_error_prints_as_error() {
    let page = open_page(ConsoleConfig::default());
    page.console.on_page_key("Enter");
    type_and_release(&page, "=>\nnope\n\n", "Enter");

    assert_eq!(
        printed(&page),
        vec![
            ("nope".to_string(), Category::Script),
            ("ReferenceError: nope is not defined".to_string(), Category::Error),
        ]
    );
}

#[test]
fn test_falsy_result_prints_nothing_extra() {
    let page = open_page(ConsoleConfig::default());
    page.console.on_page_key("Enter");
    type_and_release(&page, "=>\nvoid 0\n\n", "Enter");

    assert_eq!(printed(&page), vec![("void 0".to_string(), Category::Script)]);
}

#[test]
fn test_history_navigation_with_arrows() {
    let page = open_page(ConsoleConfig::default());
    page.console.on_page_key("Enter");
    type_and_release(&page, "first\n", "Enter");
    type_and_release(&page, "second\n", "Enter");

    page.console.on_input_key("ArrowUp");
    assert_eq!(page.viewport.input_value(), "second");
    page.console.on_input_key("ArrowUp");
    assert_eq!(page.viewport.input_value(), "first");
    page.console.on_input_key("ArrowDown");
    assert_eq!(page.viewport.input_value(), "second");
    page.console.on_input_key("ArrowDown");
    assert_eq!(page.viewport.input_value(), "");
}

#[test]
fn test_custom_marker_from_options() {
    let config = ConsoleConfig::from_json(r#"{"marker": "js>"}"#).unwrap();
    let page = open_page(config);
    page.console.on_page_key("Enter");
    type_and_release(&page, "js>\n[1, 2].length\n\n", "Enter");

    assert_eq!(
        printed(&page),
        vec![
            ("[1, 2].length".to_string(), Category::Script),
            ("2".to_string(), Category::ScriptEval),
        ]
    );
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn test_idle_input_hides_itself() {
    let page = open_page(ConsoleConfig::default());
    page.console.on_page_key("Enter");
    assert!(page.viewport.is_input_visible());

    page.scheduler.advance(f64::from(AUTO_HIDE_MS) - 1.0);
    assert!(page.viewport.is_input_visible());
    page.scheduler.advance(1.0);
    assert!(!page.viewport.is_input_visible());
    assert_eq!(page.console.input().state(), InputState::Hidden);
}

#[test]
fn test_blur_keeps_input_with_content() {
    let page = open_page(ConsoleConfig::default());
    page.console.on_page_key("Enter");
    page.viewport.set_input_value("draft");
    page.console.on_input_blur();
    assert!(page.viewport.is_input_visible());

    page.viewport.set_input_value("");
    page.console.on_input_blur();
    assert!(!page.viewport.is_input_visible());
    assert!(!page.viewport.is_focused());
}

// ============================================================================
// Print pacing
// ============================================================================

#[test]
fn test_timeouts_cadence_paces_lines() {
    let config = ConsoleConfig { use_animations: false, ..ConsoleConfig::default() };
    let page = open_page(config);
    page.console.log(&[Arg::from("a\nb")], Attributes::new());
    page.console.log(&[Arg::from("c")], Attributes::new());

    assert_eq!(page.viewport.rendered_lines().len(), 1);
    page.scheduler.advance(f64::from(LINE_DELAY_MS));
    assert_eq!(page.viewport.rendered_lines().len(), 2);

    // The second batch waits for the end-of-batch pause
    page.scheduler.advance(f64::from(LINE_DELAY_MS));
    assert_eq!(page.viewport.rendered_lines().len(), 2);
    page.scheduler.advance(f64::from(BATCH_PAUSE_MS));
    assert_eq!(page.viewport.rendered_lines().len(), 3);
}

#[test]
fn test_clear_empties_output() {
    let page = open_page(ConsoleConfig::default());
    page.console.log(&[Arg::from("gone")], Attributes::new());
    page.scheduler.run_until_idle();
    page.console.clear();
    assert!(page.viewport.nodes().is_empty());
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_load_list_and_reload_scripts() {
    let page = open_page(ConsoleConfig::default());
    page.console.load_script("app.js", None).unwrap();
    page.console.load_module("mod.js", None).unwrap();
    page.console.load_stylesheet("theme.css").unwrap();

    assert_eq!(page.console.list_scripts(), "Loaded scripts (1):\n1. app.js");
    assert_eq!(page.console.list_modules(), "Loaded modules (1):\n1. mod.js");
    assert_eq!(page.console.list_stylesheets(), "Loaded stylesheets (1):\n1. theme.css");

    let outcome = page.console.reload_script(1).unwrap();
    assert_eq!(outcome.to_string(), "Reloaded app.js?c=1");

    let outcome = page.console.reload_script(5).unwrap();
    assert_eq!(outcome, ReloadOutcome::OutOfRange(devpane::resources::ResourceKind::Script));
    assert_eq!(outcome.to_string(), "Script index is out of range!");

    assert_eq!(page.loader.live_urls().len(), 3);
    assert!(page.loader.live_urls().contains(&"app.js?c=1".to_string()));
}

#[test]
fn test_empty_url_is_rejected() {
    let page = open_page(ConsoleConfig::default());
    assert_eq!(
        page.console.load_module("", None),
        Err(ConsoleError::MissingArgument("url"))
    );
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn test_session_before_and_after_init() {
    let session = Session::new();
    assert!(matches!(session.get(), Err(ConsoleError::NotInitialized)));
    assert_eq!(
        session.get().err().map(|e| e.to_string()),
        Some("console not initiated!".to_string())
    );

    let page = open_page(ConsoleConfig::default());
    assert!(session.install(page.console));
    assert!(session.is_initialized());

    let console = session.get().unwrap();
    console.info(&[Arg::from("ready")], Attributes::new());
    page.scheduler.run_until_idle();
    assert_eq!(page.viewport.rendered_lines()[0].content, "ready");

    session.shutdown().unwrap();
    assert!(!session.is_initialized());
}

#[test]
fn test_help_lists_commands() {
    let help = Console::help();
    assert!(help.starts_with("Available functions:\n"));
    assert!(help.contains("reloadStylesheet(index)"));
}
