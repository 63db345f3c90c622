//! Browser Platform Implementation
//!
//! Provides the page collaborators via web-sys:
//! - DOM output panel and `<textarea>` input (`WebViewport`)
//! - `setTimeout` / `requestAnimationFrame` for yielding (`WebScheduler`)
//! - global `eval` for script blocks (`JsEvaluator`)
//! - `<script>` / `<link>` injection (`DomLoader`)
//! - `console.*` patching (`ConsoleHook`)

use super::{Evaluator, InputMode, Viewport};
use crate::config::ConsoleConfig;
use crate::console_log;
use crate::error::{ConsoleError, ConsoleResult};
use crate::format::Arg;
use crate::passthrough::{HostConsole, Level};
use crate::printer::{Attributes, QueuedLine};
use crate::resources::{LoadCallback, ResourceHandle, ResourceKind, ResourceLoader};
use crate::scheduler::{Defer, Scheduler, Task};
use crate::text;
use js_sys::{Array, Function, Map, Object, Reflect};
use slab::Slab;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, HtmlLinkElement, HtmlScriptElement, HtmlTextAreaElement,
    Window,
};

pub const OUTPUT_ID: &str = "console_output";
pub const CONTENT_ID: &str = "log_content";
pub const INPUT_ID: &str = "user_input";
pub const META_ID: &str = "devpane_viewport";
pub const STYLESHEET_ID: &str = "devpane_stylesheet";
const HIDDEN_CLASS: &str = "user-input-hidden";

pub fn window() -> ConsoleResult<Window> {
    web_sys::window().ok_or_else(|| ConsoleError::Platform("no window".into()))
}

pub fn document() -> ConsoleResult<Document> {
    window()?
        .document()
        .ok_or_else(|| ConsoleError::Platform("no document".into()))
}

// ============ Page bootstrap ============

/// Add the overlay's elements to the page and wrap them in a view-port.
///
/// Elements that already exist (matched by id) are reused, so mounting again
/// after a release never duplicates the overlay or its head elements.
pub fn mount(document: &Document, config: &ConsoleConfig) -> ConsoleResult<WebViewport> {
    let head: Element = document
        .head()
        .ok_or_else(|| ConsoleError::InvalidElement("document.head".into()))?
        .into();
    let body = document
        .body()
        .ok_or_else(|| ConsoleError::InvalidElement("document.body".into()))?;

    if document.get_element_by_id(META_ID).is_none() {
        let meta = document.create_element("meta")?;
        meta.set_id(META_ID);
        meta.set_attribute("name", "viewport")?;
        meta.set_attribute("content", "width=device-width, initial-scale=1.0")?;
        head.append_child(&meta)?;
    }

    let href = match &config.stylesheet_url {
        Some(url) => url.clone(),
        None => format!("{}/console.css", text::parent_path(&script_url(document), false)),
    };
    let link = match document.get_element_by_id(STYLESHEET_ID) {
        Some(link) => link,
        None => {
            let link = document.create_element("link")?;
            link.set_id(STYLESHEET_ID);
            link.set_attribute("type", "text/css")?;
            link.set_attribute("rel", "stylesheet")?;
            head.append_child(&link)?;
            link
        }
    };
    link.set_attribute("href", &href)?;

    let output = existing_or_new(document, &body, "div", OUTPUT_ID, &["console-output"])?;
    let content = existing_or_new(document, &output, "pre", CONTENT_ID, &["log-content"])?;
    let input = existing_or_new(
        document,
        &body,
        "textarea",
        INPUT_ID,
        &["user-input", InputMode::Text.class_name(), HIDDEN_CLASS],
    )?;
    input.set_attribute("rows", "1")?;
    input.set_attribute("spellcheck", "false")?;
    let input = input
        .dyn_into::<HtmlTextAreaElement>()
        .map_err(|_| ConsoleError::InvalidElement(INPUT_ID.into()))?;

    console_log!("[devpane] Mounted overlay, stylesheet {}", href);
    Ok(WebViewport {
        window: window()?,
        document: document.clone(),
        body,
        output: content,
        input,
    })
}

/// URL of the script that loaded the console, falling back to the page URL
fn script_url(document: &Document) -> String {
    document
        .current_script()
        .and_then(|s| s.dyn_into::<HtmlScriptElement>().ok())
        .map(|s| s.src())
        .filter(|src| !src.is_empty())
        .or_else(|| document.location().and_then(|l| l.href().ok()))
        .unwrap_or_default()
}

fn existing_or_new(
    document: &Document,
    parent: &Element,
    tag: &str,
    id: &str,
    classes: &[&str],
) -> ConsoleResult<Element> {
    if let Some(existing) = document.get_element_by_id(id) {
        return Ok(existing);
    }
    let element = document.create_element(tag)?;
    element.set_id(id);
    for class in classes {
        element.class_list().add_1(class)?;
    }
    parent.append_child(&element)?;
    Ok(element)
}

// ============ View-port ============

/// The mounted overlay
pub struct WebViewport {
    window: Window,
    document: Document,
    body: HtmlElement,
    output: Element,
    input: HtmlTextAreaElement,
}

impl WebViewport {
    pub fn body(&self) -> &HtmlElement {
        &self.body
    }

    pub fn input_element(&self) -> &HtmlTextAreaElement {
        &self.input
    }

    fn scrolling_element(&self) -> Element {
        self.document
            .scrolling_element()
            .unwrap_or_else(|| self.body.clone().into())
    }
}

impl Viewport for WebViewport {
    fn append_line_break(&self) {
        if let Ok(br) = self.document.create_element("br") {
            let _ = self.output.append_child(&br);
        }
    }

    fn append_text(&self, line: &QueuedLine) {
        let Ok(span) = self.document.create_element("span") else {
            return;
        };
        for (name, value) in &line.attributes.extra {
            let _ = span.set_attribute(name, value);
        }
        let _ = span.class_list().add_1(line.attributes.category.class_name());
        let _ = span.append_child(&self.document.create_text_node(&line.content));
        let _ = self.output.append_child(&span);
    }

    fn clear_output(&self) {
        while let Some(child) = self.output.last_child() {
            let _ = self.output.remove_child(&child);
        }
    }

    fn scroll_to_bottom(&self) {
        let scrolling = self.scrolling_element();
        scrolling.set_scroll_top(scrolling.scroll_height());
    }

    fn input_value(&self) -> String {
        self.input.value()
    }

    fn set_input_value(&self, value: &str) {
        self.input.set_value(value);
    }

    fn set_input_visible(&self, visible: bool) {
        let _ = self.input.class_list().toggle_with_force(HIDDEN_CLASS, !visible);
    }

    fn set_input_mode(&self, mode: InputMode) {
        let classes = self.input.class_list();
        for m in [InputMode::Text, InputMode::Script] {
            let _ = classes.toggle_with_force(m.class_name(), m == mode);
        }
    }

    fn focus_input(&self) {
        let _ = self.input.focus();
    }

    fn release_focus(&self) {
        let _ = self.input.blur();
        let _ = self.body.focus();
    }

    fn input_style_value(&self, property: &str) -> Option<String> {
        let style = self.window.get_computed_style(&self.input).ok()??;
        style
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn set_input_height(&self, height: &str) {
        let _ = self.input.style().set_property("height", height);
    }
}

// ============ Scheduler ============

/// Defers tasks through the browser's timer and frame callbacks
pub struct WebScheduler {
    window: Window,
}

impl WebScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for WebScheduler {
    fn defer(&self, when: Defer, task: Task) {
        let callback = Closure::once_into_js(move || task());
        let function: &Function = callback.unchecked_ref();
        let scheduled = match when {
            Defer::Frame => self.window.request_animation_frame(function),
            Defer::Millis(ms) => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, ms as i32),
        };
        if let Err(e) = scheduled {
            console_log!("[scheduler] Failed to schedule task: {:?}", e);
        }
    }
}

// ============ Evaluator ============

/// Evaluates script blocks with the page's global `eval`
pub struct JsEvaluator;

impl Evaluator for JsEvaluator {
    fn evaluate(&self, source: &str) -> Result<Arg, String> {
        js_sys::eval(source)
            .map(|value| arg_from_js(&value))
            .map_err(|thrown| error_message(&thrown))
    }
}

fn error_message(thrown: &JsValue) -> String {
    if let Some(error) = thrown.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    thrown.as_string().unwrap_or_else(|| js_to_string(thrown))
}

// ============ Resource loader ============

/// Injects `<script>` and `<link>` elements into `document.head`
pub struct DomLoader {
    document: Document,
    head: Element,
    elements: RefCell<Slab<Element>>,
}

impl DomLoader {
    pub fn new(document: &Document) -> ConsoleResult<Self> {
        let head = document
            .head()
            .ok_or_else(|| ConsoleError::InvalidElement("document.head".into()))?;
        Ok(Self {
            document: document.clone(),
            head: head.into(),
            elements: RefCell::new(Slab::new()),
        })
    }

    fn create(&self, url: &str, kind: ResourceKind) -> ConsoleResult<Element> {
        match kind {
            ResourceKind::Script | ResourceKind::Module => {
                let script = self
                    .document
                    .create_element("script")?
                    .dyn_into::<HtmlScriptElement>()
                    .map_err(|_| ConsoleError::InvalidElement("script".into()))?;
                let type_ = if kind == ResourceKind::Module { "module" } else { "text/javascript" };
                script.set_type(type_);
                script.set_src(url);
                Ok(script.into())
            }
            ResourceKind::Stylesheet => {
                let link = self
                    .document
                    .create_element("link")?
                    .dyn_into::<HtmlLinkElement>()
                    .map_err(|_| ConsoleError::InvalidElement("link".into()))?;
                link.set_rel("stylesheet");
                link.set_type("text/css");
                link.set_href(url);
                Ok(link.into())
            }
        }
    }
}

impl ResourceLoader for DomLoader {
    fn inject(
        &self,
        url: &str,
        kind: ResourceKind,
        on_load: Option<LoadCallback>,
    ) -> ConsoleResult<ResourceHandle> {
        if url.is_empty() {
            return Err(ConsoleError::MissingArgument("url"));
        }
        let element = self.create(url, kind)?;
        if let Some(on_load) = on_load {
            let callback = Closure::once_into_js(move || on_load());
            element.add_event_listener_with_callback("load", callback.unchecked_ref())?;
        }
        self.head.append_child(&element)?;
        Ok(ResourceHandle(self.elements.borrow_mut().insert(element)))
    }

    fn remove(&self, handle: ResourceHandle) {
        if let Some(element) = self.elements.borrow_mut().try_remove(handle.0) {
            element.remove();
        }
    }
}

// ============ console.* patching ============

/// Receives one intercepted `console.<level>(...)` call
pub type LevelSink = fn(Level, &Array) -> Result<(), JsValue>;
/// Receives an intercepted `console.clear()`
pub type ClearSink = fn() -> Result<(), JsValue>;

const LEVELS: [Level; 4] = [Level::Log, Level::Info, Level::Warn, Level::Error];

/// Builds a variadic JS function that hands its arguments to `sink` as one array
const WRAPPER_FACTORY: &str =
    "return function () { return sink(Array.prototype.slice.call(arguments)); };";

/// Rust side of one installed `console.*` wrapper
type Wrapper = Closure<dyn Fn(Array) -> Result<(), JsValue>>;

struct Originals {
    log: Function,
    info: Function,
    warn: Function,
    error: Function,
    clear: Function,
}

impl Originals {
    fn for_level(&self, level: Level) -> &Function {
        match level {
            Level::Log => &self.log,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error => &self.error,
        }
    }
}

/// The page's `console` object with its original functions captured
pub struct ConsoleHook {
    console: Object,
    originals: Originals,
    on_call: LevelSink,
    on_clear: ClearSink,
    /// Rust closures behind the installed wrappers
    wrappers: RefCell<Vec<Wrapper>>,
}

impl ConsoleHook {
    /// Capture `console.log/info/warn/error/clear` as they are right now
    pub fn capture(on_call: LevelSink, on_clear: ClearSink) -> ConsoleResult<Self> {
        let console = Reflect::get(&js_sys::global(), &JsValue::from_str("console"))?
            .dyn_into::<Object>()
            .map_err(|_| ConsoleError::Platform("console is not an object".into()))?;
        let get = |name: &str| -> ConsoleResult<Function> {
            Reflect::get(&console, &JsValue::from_str(name))?
                .dyn_into::<Function>()
                .map_err(|_| ConsoleError::Platform(format!("console.{} is not a function", name)))
        };
        let originals = Originals {
            log: get("log")?,
            info: get("info")?,
            warn: get("warn")?,
            error: get("error")?,
            clear: get("clear")?,
        };
        Ok(Self {
            console,
            originals,
            on_call,
            on_clear,
            wrappers: RefCell::new(Vec::new()),
        })
    }

    fn patch(&self, name: &str, closure: Wrapper) -> ConsoleResult<()> {
        let factory = Function::new_with_args("sink", WRAPPER_FACTORY);
        let wrapper = factory.call1(&JsValue::NULL, closure.as_ref())?;
        Reflect::set(&self.console, &JsValue::from_str(name), &wrapper)?;
        self.wrappers.borrow_mut().push(closure);
        Ok(())
    }

    fn restore(&self, name: &str, original: &Function) {
        let _ = Reflect::set(&self.console, &JsValue::from_str(name), original);
    }
}

impl HostConsole for ConsoleHook {
    fn install(&self) -> ConsoleResult<()> {
        for level in LEVELS {
            let on_call = self.on_call;
            let closure = Closure::wrap(
                Box::new(move |args: Array| on_call(level, &args))
                    as Box<dyn Fn(Array) -> Result<(), JsValue>>,
            );
            self.patch(level.method_name(), closure)?;
        }
        let on_clear = self.on_clear;
        let closure = Closure::wrap(
            Box::new(move |_args: Array| on_clear()) as Box<dyn Fn(Array) -> Result<(), JsValue>>
        );
        self.patch("clear", closure)?;
        console_log!("[passthrough] Patched console.log/info/warn/error/clear");
        Ok(())
    }

    fn uninstall(&self) {
        for level in LEVELS {
            self.restore(level.method_name(), self.originals.for_level(level));
        }
        self.restore("clear", &self.originals.clear);
        self.wrappers.borrow_mut().clear();
    }

    fn forward(&self, level: Level, args: &[Arg]) {
        let array: Array = args.iter().map(arg_to_js).collect();
        let _ = self.originals.for_level(level).apply(&self.console, &array);
    }

    fn clear(&self) {
        let _ = self.originals.clear.call0(&self.console);
    }
}

// ============ Value conversion ============

/// Snapshot a JS value into the console's argument model
pub fn arg_from_js(value: &JsValue) -> Arg {
    if value.is_undefined() {
        return Arg::Undefined;
    }
    if value.is_null() {
        return Arg::Null;
    }
    if let Some(b) = value.as_bool() {
        return Arg::Bool(b);
    }
    if let Some(n) = value.as_f64() {
        return Arg::Number(n);
    }
    if let Some(s) = value.as_string() {
        return Arg::Str(s);
    }
    if value.is_symbol() {
        return Arg::Symbol(js_to_string(value));
    }
    if value.is_function() {
        return Arg::Function(js_to_string(value));
    }
    if value.is_bigint() {
        return Arg::Str(js_to_string(value));
    }
    match to_json(value) {
        Some(json) => Arg::Object(json),
        None => Arg::Str(js_to_string(value)),
    }
}

pub fn arg_to_js(arg: &Arg) -> JsValue {
    match arg {
        Arg::Undefined => JsValue::UNDEFINED,
        Arg::Null => JsValue::NULL,
        Arg::Bool(b) => JsValue::from_bool(*b),
        Arg::Number(n) => JsValue::from_f64(*n),
        Arg::Str(s) | Arg::Symbol(s) | Arg::Function(s) => JsValue::from_str(s),
        Arg::Object(json) => {
            let text = json.to_string();
            js_sys::JSON::parse(&text).unwrap_or_else(|_| JsValue::from_str(&text))
        }
    }
}

/// Split a variadic call into its arguments and the trailing attributes map.
///
/// The last argument counts as attributes only when it is a `Map` and at
/// least one other argument precedes it.
pub fn split_args(args: &Array) -> (Vec<Arg>, Attributes) {
    let mut values: Vec<JsValue> = args.iter().collect();
    let mut attributes = Attributes::new();
    if values.len() > 1 {
        if let Some(map) = values.last().and_then(|v| v.dyn_ref::<Map>()) {
            attributes = attributes_from_map(map);
            values.pop();
        }
    }
    (values.iter().map(arg_from_js).collect(), attributes)
}

/// String-keyed entries of an attributes `Map`; other keys are skipped
pub fn attributes_from_map(map: &Map) -> Attributes {
    let mut attributes = Attributes::new();
    map.for_each(&mut |value, key| {
        if let Some(key) = key.as_string() {
            let value = value.as_string().unwrap_or_else(|| js_to_string(&value));
            attributes.insert(key, value);
        }
    });
    attributes
}

fn to_json(value: &JsValue) -> Option<serde_json::Value> {
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

fn js_to_string(value: &JsValue) -> String {
    String::from(value.unchecked_ref::<Object>().to_string())
}
